// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Registry of open database connections.
//!
//! Connections are keyed by the resolved database path, so two logical
//! names that resolve to the same file share one connection. At most one
//! connection exists per path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info, warn};

use sqlbridge_db::{DbHandle, OpenMode};

use crate::error::{Result, SessionError, usage};
use crate::paths::PathResolver;

/// A live connection owned by the registry.
#[derive(Debug)]
pub struct OpenConnection {
    handle: DbHandle,
    path: PathBuf,
}

impl OpenConnection {
    pub fn handle(&self) -> &DbHandle {
        &self.handle
    }

    /// Resolved database path the connection is registered under.
    ///
    /// For read-only asset databases this differs from the file the handle
    /// was opened at.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Options for [`ConnectionRegistry::open`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenOptions {
    /// Asset spec to provision the database from on first open
    pub asset: Option<String>,
    /// Open the asset itself read-only instead of copying it
    pub read_only: bool,
}

pub struct ConnectionRegistry<R> {
    resolver: R,
    connections: HashMap<PathBuf, OpenConnection>,
}

impl<R: PathResolver> ConnectionRegistry<R> {
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            connections: HashMap::new(),
        }
    }

    /// Open a database, provisioning it from an asset if one is given.
    ///
    /// Opening a database that is already open succeeds without side effects.
    pub async fn open(&mut self, name: &str, options: &OpenOptions) -> Result<()> {
        if name.is_empty() {
            return Err(SessionError::Usage(usage::OPEN_NAME));
        }

        let path = self.resolver.resolve_database_path(name)?;
        if self.connections.contains_key(&path) {
            debug!("Database {} already open", path.display());
            return Ok(());
        }

        let asset = match options.asset.as_deref() {
            Some(spec) if !spec.is_empty() => {
                self.resolver.resolve_asset_source(spec, name).await?
            }
            _ => None,
        };

        let (target, mode) = match asset {
            Some(source) if options.read_only => (source, OpenMode::ReadOnly),
            Some(source) => {
                self.resolver.copy_asset(&source, &path).await?;
                (path.clone(), OpenMode::Create)
            }
            None => (path.clone(), OpenMode::Create),
        };

        if mode == OpenMode::Create {
            if let Some(parent) = target.parent() {
                if let Err(e) = fs::create_dir_all(parent).await {
                    warn!("Failed to create {}: {e}", parent.display());
                }
            }
        }

        let opened = target.clone();
        let handle = native(move || DbHandle::open(&opened, mode))
            .await?
            .map_err(|source| SessionError::NativeOpen {
                path: target.clone(),
                source,
            })?;

        info!("Opened {} ({:?})", path.display(), mode);
        self.connections
            .insert(path.clone(), OpenConnection { handle, path });
        Ok(())
    }

    /// Close an open database.
    pub fn close(&mut self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(SessionError::Usage(usage::CLOSE_PATH));
        }

        let path = self.resolver.resolve_database_path(name)?;
        if self.close_if_open(&path) {
            Ok(())
        } else {
            Err(SessionError::NotOpen)
        }
    }

    /// Close a database if it is open, then remove its file.
    pub async fn delete(&mut self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(SessionError::Usage(usage::DELETE_NAME));
        }

        let path = self.resolver.resolve_database_path(name)?;
        if let Some(connection) = self.connections.remove(&path) {
            native(move || close_connection(connection)).await?;
        }

        fs::remove_file(&path)
            .await
            .map_err(|e| SessionError::FileDelete {
                message: e.to_string(),
                path: path.clone(),
            })?;
        info!("Deleted {}", path.display());
        Ok(())
    }

    /// Find the open connection for a logical name.
    pub fn lookup(&self, name: &str) -> Option<&OpenConnection> {
        let path = self.resolver.resolve_database_path(name).ok()?;
        self.connections.get(&path)
    }

    pub fn is_open(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }
}

impl<R> ConnectionRegistry<R> {
    /// Number of open connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Close every remaining connection.
    pub fn teardown(&mut self) {
        if self.connections.is_empty() {
            return;
        }
        debug!("Closing {} open database(s)", self.connections.len());
        for (_, connection) in self.connections.drain() {
            close_connection(connection);
        }
    }

    /// Close the connection registered under `path`, returning whether one was open.
    fn close_if_open(&mut self, path: &Path) -> bool {
        match self.connections.remove(path) {
            Some(connection) => {
                close_connection(connection);
                true
            }
            None => false,
        }
    }
}

/// Close failures are logged only; the entry is gone either way.
fn close_connection(connection: OpenConnection) {
    let OpenConnection { handle, path } = connection;
    match handle.close() {
        Ok(()) => info!("Closed {}", path.display()),
        Err(e) => warn!("Error closing database: {e}"),
    }
}

/// Run a native SQLite call on the blocking pool.
async fn native<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| SessionError::OperationPanicked(format!("Task join error: {e}")))
}

impl<R> Drop for ConnectionRegistry<R> {
    fn drop(&mut self) {
        self.teardown();
    }
}
