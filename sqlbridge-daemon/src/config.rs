// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use sqlbridge_session::FsPathResolver;

use crate::error::{DaemonError, IoContext};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Path to bind the daemon socket
    pub socket_path: PathBuf,

    /// Directory holding the databases
    pub data_dir: PathBuf,

    /// Directory holding bundled asset databases
    pub bundle_dir: PathBuf,

    /// Log level, used when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from("/run/sqlbridge/daemon.sock"),
            data_dir: PathBuf::from("/var/lib/sqlbridge"),
            bundle_dir: PathBuf::from("/usr/share/sqlbridge"),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, DaemonError> {
        let contents = std::fs::read_to_string(path)
            .io_context(|| format!("Failed to read config file at {}", path.display()))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, DaemonError> {
        let config: Config = toml::from_str(contents)?;
        if config.socket_path.as_os_str().is_empty() {
            return Err(DaemonError::config("socket_path must not be empty"));
        }
        Ok(config)
    }

    pub fn resolver(&self) -> FsPathResolver {
        FsPathResolver::new(&self.data_dir, &self.bundle_dir)
    }
}
