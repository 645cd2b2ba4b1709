// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Database sessions for sqlbridge.
//!
//! A [`SessionHandler`] owns a [`ConnectionRegistry`] behind a
//! [`SessionQueue`]: host requests to open, close, delete and run batches
//! against databases are executed one at a time, in submission order.
//!
//! # Example
//!
//! ```ignore
//! use sqlbridge_session::{FsPathResolver, OpenOptions, SessionHandler};
//!
//! let handler = SessionHandler::new(FsPathResolver::new("/var/lib/app", "/usr/share/app"));
//! handler.open("app.db".into(), OpenOptions::default()).await?;
//! let results = handler
//!     .execute_sql_batch("app.db".into(), vec![SqlStatement::new(1, "SELECT 1")])
//!     .await?;
//! ```

pub mod error;
pub mod handler;
pub mod paths;
pub mod protocol;
pub mod queue;
pub mod registry;

pub use error::{Result, SessionError};
pub use handler::SessionHandler;
pub use paths::{FsPathResolver, PathResolver};
pub use protocol::{Request, Response};
pub use queue::{Session, SessionQueue};
pub use registry::{ConnectionRegistry, OpenConnection, OpenOptions};

#[cfg(test)]
mod tests;
