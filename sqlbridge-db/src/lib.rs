// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! SQLite access layer for sqlbridge.
//!
//! This crate is the boundary between dynamically typed host requests and
//! the embedded SQLite engine: it opens native handles, converts host
//! values to bind parameters and result columns back to host values, and
//! executes statement batches with per-statement outcomes.
//!
//! # Example
//!
//! ```ignore
//! use sqlbridge_db::{DbHandle, OpenMode, SqlStatement, execute_batch};
//!
//! let db = DbHandle::open("/tmp/t.db", OpenMode::Create)?;
//! let results = execute_batch(&db, &[SqlStatement::new(1, "CREATE TABLE a(x)")]);
//! assert!(results[0].is_success());
//! ```

mod batch;
pub mod codec;
mod connection;
mod error;
mod types;

pub use batch::{EMPTY_SQL_MESSAGE, execute_batch, execute_statement};
pub use connection::{Cursor, DbHandle, OpenMode, PreparedStatement, Step};
pub use error::{Error, Result};
pub use types::*;
