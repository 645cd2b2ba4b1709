// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Self-contained data and bundle directories for session tests.

use std::path::{Path, PathBuf};

use sqlbridge_db::{DbHandle, OpenMode};
use sqlbridge_utils_test::CanonicalTempDir;

use crate::handler::SessionHandler;
use crate::paths::FsPathResolver;
use crate::registry::ConnectionRegistry;

/// A temporary `data/` and `bundle/` pair with a resolver over them.
pub struct TestEnv {
    pub resolver: FsPathResolver,
    _temp_dir: CanonicalTempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = CanonicalTempDir::new().expect("failed to create temp dir");
        let data_dir = temp_dir.subdir("data").expect("failed to create data dir");
        let bundle_dir = temp_dir.subdir("bundle").expect("failed to create bundle dir");
        Self {
            resolver: FsPathResolver::new(data_dir, bundle_dir),
            _temp_dir: temp_dir,
        }
    }

    pub fn data_path(&self, name: &str) -> PathBuf {
        self.resolver.data_dir().join(name)
    }

    pub fn bundle_path(&self, relative: &str) -> PathBuf {
        self.resolver.bundle_dir().join(relative)
    }

    pub fn registry(&self) -> ConnectionRegistry<FsPathResolver> {
        ConnectionRegistry::new(self.resolver.clone())
    }

    pub fn handler(&self) -> SessionHandler<FsPathResolver> {
        SessionHandler::new(self.resolver.clone())
    }

    /// Write a bundled asset database holding `greeting(msg)` with one row.
    pub fn write_asset(&self, relative: &str, message: &str) -> PathBuf {
        let path = self.bundle_path(relative);
        write_seed_database(&path, message);
        path
    }
}

fn write_seed_database(path: &Path, message: &str) {
    std::fs::create_dir_all(path.parent().expect("asset path has a parent"))
        .expect("failed to create asset dir");
    let db = DbHandle::open(path, OpenMode::Create).expect("failed to create asset");
    db.connection()
        .execute_batch("CREATE TABLE greeting(msg TEXT)")
        .expect("failed to create table");
    db.connection()
        .execute("INSERT INTO greeting VALUES (?1)", [message])
        .expect("failed to insert row");
    db.close().expect("failed to close asset");
}
