// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Error types for driver operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for driver operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the SQLite engine.
#[derive(Error, Debug)]
pub enum Error {
    /// SQLite error
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to open database with context
    #[error("Failed to open database at '{path}': {source}")]
    DatabaseOpen {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Failed to close database, the handle has been released regardless
    #[error("Failed to close database at '{path}': {source}")]
    DatabaseClose {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Database file not found
    #[error("Database not found at: {0}")]
    DatabaseNotFound(PathBuf),
}

impl Error {
    /// The message the engine reported, without any wrapper context.
    ///
    /// Statement failures are reported to callers verbatim, the way
    /// `sqlite3_errmsg` phrases them.
    pub fn driver_message(&self) -> String {
        match self {
            Error::Sqlite(e)
            | Error::DatabaseOpen { source: e, .. }
            | Error::DatabaseClose { source: e, .. } => sqlite_message(e),
            Error::DatabaseNotFound(_) => self.to_string(),
        }
    }
}

fn sqlite_message(e: &rusqlite::Error) -> String {
    match e {
        rusqlite::Error::SqliteFailure(_, Some(msg)) if !msg.is_empty() => msg.clone(),
        other => other.to_string(),
    }
}
