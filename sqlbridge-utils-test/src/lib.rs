// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Test utilities for sqlbridge.
//!
//! This crate provides temporary directory helpers and proptest strategies
//! shared by the sqlbridge crates' tests.

use std::path::{Path, PathBuf};

use proptest::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

/// A wrapper around TempDir that provides a canonicalized path.
/// This resolves symlinks like /var -> /private/var on macOS, so paths
/// handed out by a resolver compare equal to the ones tests build.
pub struct CanonicalTempDir {
    _inner: TempDir,
    path: PathBuf,
}

impl CanonicalTempDir {
    /// Create a new temporary directory with a canonicalized path.
    pub fn new() -> std::io::Result<Self> {
        let inner = TempDir::new()?;
        let path = inner.path().canonicalize()?;
        Ok(Self {
            _inner: inner,
            path,
        })
    }

    /// Get the canonicalized path to the temporary directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create (if needed) and return a subdirectory.
    pub fn subdir(&self, name: &str) -> std::io::Result<PathBuf> {
        let dir = self.path.join(name);
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

/// Arbitrary blob contents, including the empty blob.
pub fn arb_blob() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(any::<u8>(), 0..512)
}

/// Arbitrary scalar JSON value of the kinds a host passes as parameters.
pub fn arb_json_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        (-1.0e12f64..1.0e12f64).prop_map(Value::from),
        "[a-zA-Z0-9 _.-]{0,32}".prop_map(Value::from),
    ]
}

/// Arbitrary parameter value, scalars plus the compound values that fall
/// back to their JSON text.
pub fn arb_json_param() -> impl Strategy<Value = Value> {
    prop_oneof![
        4 => arb_json_scalar(),
        1 => proptest::collection::vec(arb_json_scalar(), 0..4).prop_map(Value::Array),
    ]
}

/// Arbitrary SQL identifier safe to interpolate into test statements.
pub fn arb_identifier() -> impl Strategy<Value = String> {
    "c_[a-z0-9_]{0,15}"
}
