// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Database connection management.
//!
//! A narrow wrapper over rusqlite exposing the operations the batch
//! executor needs: prepare, positional bind, step, column access and the
//! connection counters.

use std::path::{Path, PathBuf};

use rusqlite::fallible_iterator::FallibleIterator;
use rusqlite::{Batch, Connection, OpenFlags, Rows, Statement};
use tracing::{debug, warn};

use crate::codec;
use crate::error::{Error, Result};
use crate::types::{BindValue, ColumnValue};

/// Database open mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Read-only access to an existing file (bundled assets)
    ReadOnly,
    /// Read-write access, creating the file if it does not exist
    Create,
}

impl OpenMode {
    fn flags(self) -> OpenFlags {
        // Access is serialized by the session queue, so SQLite's own
        // connection mutex is unnecessary.
        let base = OpenFlags::SQLITE_OPEN_NO_MUTEX;
        match self {
            OpenMode::ReadOnly => base | OpenFlags::SQLITE_OPEN_READ_ONLY,
            OpenMode::Create => {
                base | OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE
            }
        }
    }
}

/// An open native connection.
pub struct DbHandle {
    conn: Connection,
    path: PathBuf,
}

impl std::fmt::Debug for DbHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbHandle").field("path", &self.path).finish()
    }
}

impl DbHandle {
    /// Open a database file.
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self> {
        let path = path.as_ref();
        if mode == OpenMode::ReadOnly && !path.exists() {
            return Err(Error::DatabaseNotFound(path.to_owned()));
        }

        let conn = Connection::open_with_flags(path, mode.flags()).map_err(|e| {
            Error::DatabaseOpen {
                path: path.to_owned(),
                source: e,
            }
        })?;

        debug!("Opened database at {} ({:?})", path.display(), mode);
        Ok(Self {
            conn,
            path: path.to_owned(),
        })
    }

    /// Create an in-memory database (for testing).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        debug!("Created in-memory database");
        Ok(Self {
            conn,
            path: PathBuf::from(":memory:"),
        })
    }

    /// Filesystem path the handle was opened at.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close the handle.
    ///
    /// The native handle is released even when SQLite reports an error.
    pub fn close(self) -> Result<()> {
        let path = self.path;
        self.conn.close().map_err(|(conn, source)| {
            warn!("SQLite refused to close {}, dropping handle", path.display());
            drop(conn);
            Error::DatabaseClose { path, source }
        })
    }

    /// Compile the first statement of `sql`; any trailing statements are ignored.
    ///
    /// Returns `None` when `sql` holds no statement at all (only comments or
    /// separators).
    pub fn prepare(&self, sql: &str) -> Result<Option<PreparedStatement<'_>>> {
        let stmt = Batch::new(&self.conn, sql).next()?;
        Ok(stmt.map(|stmt| PreparedStatement { stmt }))
    }

    /// Number of rows changed by all statements since the connection opened.
    pub fn total_changes(&self) -> Result<i64> {
        let changes = self
            .conn
            .query_row("SELECT total_changes()", [], |row| row.get(0))?;
        Ok(changes)
    }

    /// Rowid of the most recent successful insert, 0 if none.
    pub fn last_insert_id(&self) -> i64 {
        self.conn.last_insert_rowid()
    }

    /// Get raw connection (for advanced usage).
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// A compiled statement. Dropping it finalizes the native statement.
pub struct PreparedStatement<'conn> {
    stmt: Statement<'conn>,
}

impl<'conn> PreparedStatement<'conn> {
    /// Number of `?` placeholders in the statement.
    pub fn parameter_count(&self) -> usize {
        self.stmt.parameter_count()
    }

    /// Bind a value to the 1-based placeholder `index`.
    pub fn bind(&mut self, index: usize, value: &BindValue) -> Result<()> {
        self.stmt.raw_bind_parameter(index, value)?;
        Ok(())
    }

    /// Result column names, in column order.
    pub fn column_names(&self) -> Vec<String> {
        self.stmt
            .column_names()
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    /// Start stepping through the statement.
    pub fn cursor(&mut self) -> Cursor<'_> {
        let columns = self.column_names();
        Cursor {
            rows: self.stmt.raw_query(),
            columns,
        }
    }

    /// Release the native statement.
    pub fn finalize(self) -> Result<()> {
        self.stmt.finalize()?;
        Ok(())
    }
}

/// Result of a single step.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// The statement produced a row: `(column name, value)` pairs in column order
    Row(Vec<(String, ColumnValue)>),
    /// The statement ran to completion
    Done,
}

/// Stepping state of a running statement.
pub struct Cursor<'stmt> {
    rows: Rows<'stmt>,
    columns: Vec<String>,
}

impl Cursor<'_> {
    /// Advance the statement by one step.
    pub fn step(&mut self) -> Result<Step> {
        let Some(row) = self.rows.next()? else {
            return Ok(Step::Done);
        };
        let mut values = Vec::with_capacity(self.columns.len());
        for (i, name) in self.columns.iter().enumerate() {
            values.push((name.clone(), codec::from_column(row.get_ref(i)?)));
        }
        Ok(Step::Row(values))
    }
}
