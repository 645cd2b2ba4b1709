// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Storage path resolution and asset provisioning.

use std::future::Future;
use std::path::{Component, Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{Result, SessionError, usage};

/// Asset spec naming the default bundled copy of the database.
pub const DEFAULT_ASSET: &str = "1";

/// Where databases and their bundled assets live.
///
/// Implementations map logical database names to files and locate the
/// pre-populated copies a database can be provisioned from.
pub trait PathResolver: Send + Sync + 'static {
    /// Absolute path of the database file for a logical name.
    ///
    /// Fails for names that do not stay inside the data area.
    fn resolve_database_path(&self, name: &str) -> Result<PathBuf>;

    /// Locate the asset a database should be provisioned from.
    ///
    /// Returns `Ok(None)` when no asset was requested.
    fn resolve_asset_source(
        &self,
        asset_spec: &str,
        name: &str,
    ) -> impl Future<Output = Result<Option<PathBuf>>> + Send;

    /// Copy an asset to `dest`, failing if `dest` already exists.
    fn copy_asset(&self, source: &Path, dest: &Path) -> impl Future<Output = Result<()>> + Send;
}

/// Filesystem-backed resolver.
///
/// Databases live directly under `data_dir`. Asset specs resolve as:
/// - `"1"`: `bundle_dir/www/<name>`
/// - `"~rel/path"`: `bundle_dir/rel/path`
/// - anything else: a path under `data_dir`
///
/// Names and asset paths must be relative and may not contain `..`.
#[derive(Debug, Clone)]
pub struct FsPathResolver {
    data_dir: PathBuf,
    bundle_dir: PathBuf,
}

impl FsPathResolver {
    pub fn new(data_dir: impl Into<PathBuf>, bundle_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            bundle_dir: bundle_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn bundle_dir(&self) -> &Path {
        &self.bundle_dir
    }

    fn asset_location(&self, asset_spec: &str, name: &str) -> Option<PathBuf> {
        if asset_spec == DEFAULT_ASSET {
            confined(&self.bundle_dir.join("www"), name)
        } else if let Some(relative) = asset_spec.strip_prefix('~') {
            confined(&self.bundle_dir, relative)
        } else {
            confined(&self.data_dir, asset_spec)
        }
    }
}

/// Join `relative` onto `base`, or `None` if the result would not be a file
/// strictly below `base`.
fn confined(base: &Path, relative: &str) -> Option<PathBuf> {
    let mut path = base.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    (path.as_path() != base).then_some(path)
}

impl PathResolver for FsPathResolver {
    fn resolve_database_path(&self, name: &str) -> Result<PathBuf> {
        confined(&self.data_dir, name).ok_or(SessionError::Usage(usage::CONFINED_NAME))
    }

    async fn resolve_asset_source(&self, asset_spec: &str, name: &str) -> Result<Option<PathBuf>> {
        if asset_spec.is_empty() {
            return Ok(None);
        }
        let Some(location) = self.asset_location(asset_spec, name) else {
            return Err(SessionError::provisioning(format!(
                "Unable to open asset file: '{asset_spec}' is outside the asset directories"
            )));
        };
        match fs::metadata(&location).await {
            Ok(meta) if meta.is_file() => {
                debug!("Resolved asset '{asset_spec}' to {}", location.display());
                Ok(Some(location))
            }
            Ok(_) => Err(SessionError::provisioning(format!(
                "Unable to open asset file: {} is not a file",
                location.display()
            ))),
            Err(e) => Err(SessionError::provisioning(format!(
                "Unable to open asset file: {e}"
            ))),
        }
    }

    async fn copy_asset(&self, source: &Path, dest: &Path) -> Result<()> {
        let copy_failed = |e: std::io::Error| {
            SessionError::provisioning(format!("Unable to copy asset file: {e}"))
        };

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await.map_err(copy_failed)?;
        }
        let mut reader = fs::File::open(source).await.map_err(copy_failed)?;
        let mut writer = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dest)
            .await
            .map_err(copy_failed)?;

        let copied = tokio::io::copy(&mut reader, &mut writer)
            .await
            .map_err(copy_failed)?;
        writer.flush().await.map_err(copy_failed)?;
        writer.sync_all().await.map_err(copy_failed)?;

        debug!(
            "Provisioned {} from {} ({copied} bytes)",
            dest.display(),
            source.display()
        );
        Ok(())
    }
}
