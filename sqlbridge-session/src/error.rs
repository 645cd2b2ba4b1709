// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Errors reported to the host for session operations.
//!
//! The `Display` text of each variant is the exact message the host sees.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Error, Debug)]
pub enum SessionError {
    /// A required request field was missing or empty
    #[error("{0}")]
    Usage(&'static str),

    /// Close of a database that is not in the registry
    #[error("Specified db was not open")]
    NotOpen,

    /// Batch or attach against a database that is not in the registry
    #[error("No such database, you must open it first")]
    NoSuchDatabase,

    /// The bundled asset could not be located or copied
    #[error("{0}")]
    Provisioning(String),

    /// SQLite refused to open the file
    #[error("unable to open database")]
    NativeOpen {
        path: PathBuf,
        #[source]
        source: sqlbridge_db::Error,
    },

    /// Removing the database file failed
    #[error("Error deleting database: {message} {}", .path.display())]
    FileDelete { message: String, path: PathBuf },

    #[error("attach isn't supported on this platform")]
    AttachUnsupported,

    /// The session queue has shut down
    #[error("Database session queue is closed")]
    QueueClosed,

    /// An operation panicked inside the queue worker
    #[error("Internal error: {0}")]
    OperationPanicked(String),
}

impl SessionError {
    pub fn provisioning(message: impl Into<String>) -> Self {
        Self::Provisioning(message.into())
    }
}

/// Fixed usage messages, phrased as the host plugin always has.
pub mod usage {
    pub const OPEN_NAME: &str = "You must specify the database name";
    pub const CLOSE_PATH: &str = "You must specify database path";
    pub const DELETE_NAME: &str = "You must specify database name";
    pub const BATCH_PATH: &str = "You must specify database path";
    pub const CONFINED_NAME: &str =
        "Database name must be a relative path inside the data directory";
}
