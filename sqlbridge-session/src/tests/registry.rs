// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Tests for opening, closing and deleting databases through the registry.

use rstest::rstest;

use sqlbridge_db::{QueryResult, SqlStatement, execute_batch};

use super::test_env::TestEnv;
use crate::error::{SessionError, usage};
use crate::registry::OpenOptions;

fn asset(spec: &str, read_only: bool) -> OpenOptions {
    OpenOptions {
        asset: Some(spec.to_string()),
        read_only,
    }
}

/// Opening twice succeeds both times and keeps a single connection.
#[test_log::test(tokio::test)]
async fn test_open_is_idempotent() {
    let env = TestEnv::new();
    let mut registry = env.registry();

    registry.open("t.db", &OpenOptions::default()).await.unwrap();
    registry.open("t.db", &OpenOptions::default()).await.unwrap();

    assert_eq!(registry.len(), 1);
    assert!(registry.is_open("t.db"));
    assert!(env.data_path("t.db").exists());
}

/// Names resolving to the same file share one connection.
#[test_log::test(tokio::test)]
async fn test_equivalent_names_share_a_connection() {
    let env = TestEnv::new();
    let mut registry = env.registry();

    registry.open("t.db", &OpenOptions::default()).await.unwrap();
    registry.open("./t.db", &OpenOptions::default()).await.unwrap();

    assert_eq!(registry.len(), 1);
    assert_eq!(
        registry.lookup("./t.db").unwrap().path(),
        env.data_path("t.db")
    );
    registry.close("./t.db").unwrap();
    assert!(!registry.is_open("t.db"));
}

#[rstest]
#[case::parent("../outside.db")]
#[case::nested_parent("sub/../../outside.db")]
#[tokio::test]
async fn open_refuses_names_leaving_data_dir(#[case] name: &str) {
    let env = TestEnv::new();
    let mut registry = env.registry();

    let err = registry
        .open(name, &OpenOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), usage::CONFINED_NAME);
    assert!(registry.is_empty());
    assert!(!env.data_path("../outside.db").exists());
}

#[test_log::test(tokio::test)]
async fn test_absolute_names_never_touch_other_files() {
    let env = TestEnv::new();
    let elsewhere = sqlbridge_utils_test::CanonicalTempDir::new().unwrap();
    let victim = elsewhere.path().join("victim.txt");
    std::fs::write(&victim, b"keep me").unwrap();
    let victim_name = victim.to_str().unwrap();
    let mut registry = env.registry();

    let err = registry.delete(victim_name).await.unwrap_err();
    assert!(matches!(err, SessionError::Usage(usage::CONFINED_NAME)));
    assert!(victim.exists());

    let created = elsewhere.path().join("x.db");
    let err = registry
        .open(created.to_str().unwrap(), &OpenOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Usage(_)));
    assert!(!created.exists());

    assert!(matches!(
        registry.close(victim_name),
        Err(SessionError::Usage(_))
    ));
    assert!(registry.lookup(victim_name).is_none());
}

#[rstest]
#[case::close("close", usage::CLOSE_PATH)]
#[case::delete("delete", usage::DELETE_NAME)]
#[case::open("open", usage::OPEN_NAME)]
#[tokio::test]
async fn empty_name_is_usage_error(#[case] operation: &str, #[case] message: &str) {
    let env = TestEnv::new();
    let mut registry = env.registry();

    let err = match operation {
        "open" => registry.open("", &OpenOptions::default()).await,
        "close" => registry.close(""),
        "delete" => registry.delete("").await,
        _ => unreachable!(),
    }
    .unwrap_err();

    assert_eq!(err.to_string(), message);
    assert!(registry.is_empty());
}

#[test_log::test(tokio::test)]
async fn test_close_unknown_database() {
    let env = TestEnv::new();
    let mut registry = env.registry();

    let err = registry.close("never.db").unwrap_err();
    assert!(matches!(err, SessionError::NotOpen));
    assert_eq!(err.to_string(), "Specified db was not open");
}

#[test_log::test(tokio::test)]
async fn test_close_then_reopen() {
    let env = TestEnv::new();
    let mut registry = env.registry();

    registry.open("t.db", &OpenOptions::default()).await.unwrap();
    registry.close("t.db").unwrap();
    assert!(!registry.is_open("t.db"));
    assert!(matches!(registry.close("t.db"), Err(SessionError::NotOpen)));

    registry.open("t.db", &OpenOptions::default()).await.unwrap();
    assert!(registry.is_open("t.db"));
}

/// The asset is copied before the first statement runs.
#[test_log::test(tokio::test)]
async fn test_open_provisions_default_asset() {
    let env = TestEnv::new();
    env.write_asset("www/seed.db", "hello from the bundle");
    let mut registry = env.registry();

    registry
        .open("seed.db", &asset(crate::paths::DEFAULT_ASSET, false))
        .await
        .unwrap();
    assert!(env.data_path("seed.db").exists());

    let connection = registry.lookup("seed.db").unwrap();
    let results = execute_batch(
        connection.handle(),
        &[SqlStatement::new(1, "SELECT msg FROM greeting")],
    );
    let json = serde_json::to_value(&results).unwrap();
    assert_eq!(json[0]["result"]["rows"][0]["msg"], "hello from the bundle");
}

/// A read-only asset is used in place and never copied.
#[test_log::test(tokio::test)]
async fn test_open_read_only_asset() {
    let env = TestEnv::new();
    env.write_asset("seed/base.db", "shipped");
    let mut registry = env.registry();

    registry
        .open("ro.db", &asset("~seed/base.db", true))
        .await
        .unwrap();
    assert!(!env.data_path("ro.db").exists());

    let connection = registry.lookup("ro.db").unwrap();
    assert_eq!(connection.path(), env.data_path("ro.db"));
    let results = execute_batch(
        connection.handle(),
        &[SqlStatement::new(1, "INSERT INTO greeting VALUES ('nope')")],
    );
    let QueryResult::Error { error, .. } = &results[0] else {
        panic!("write to a read-only asset must fail");
    };
    assert!(error.contains("readonly"), "{error}");
}

#[test_log::test(tokio::test)]
async fn test_missing_asset_aborts_open() {
    let env = TestEnv::new();
    let mut registry = env.registry();

    let err = registry
        .open("t.db", &asset(crate::paths::DEFAULT_ASSET, false))
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::Provisioning(_)));
    assert!(registry.is_empty());
    assert!(!env.data_path("t.db").exists());
}

/// Provisioning refuses to overwrite an existing database file.
#[test_log::test(tokio::test)]
async fn test_asset_copy_fails_over_existing_file() {
    let env = TestEnv::new();
    env.write_asset("www/t.db", "bundled");
    std::fs::write(env.data_path("t.db"), b"").unwrap();
    let mut registry = env.registry();

    let err = registry
        .open("t.db", &asset(crate::paths::DEFAULT_ASSET, false))
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("Unable to copy asset file"), "{err}");
    assert!(registry.is_empty());
}

#[test_log::test(tokio::test)]
async fn test_native_open_failure() {
    let env = TestEnv::new();
    std::fs::create_dir_all(env.data_path("dir.db")).unwrap();
    let mut registry = env.registry();

    let err = registry
        .open("dir.db", &OpenOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::NativeOpen { .. }));
    assert_eq!(err.to_string(), "unable to open database");
}

#[test_log::test(tokio::test)]
async fn test_delete_closes_and_removes_file() {
    let env = TestEnv::new();
    let mut registry = env.registry();

    registry.open("t.db", &OpenOptions::default()).await.unwrap();
    registry.delete("t.db").await.unwrap();

    assert!(!registry.is_open("t.db"));
    assert!(!env.data_path("t.db").exists());
}

#[test_log::test(tokio::test)]
async fn test_delete_missing_file() {
    let env = TestEnv::new();
    let mut registry = env.registry();

    let err = registry.delete("gone.db").await.unwrap_err();
    assert!(matches!(err, SessionError::FileDelete { .. }));
    let message = err.to_string();
    assert!(message.starts_with("Error deleting database: "), "{message}");
    assert!(message.ends_with(&env.data_path("gone.db").display().to_string()));
}

#[test_log::test(tokio::test)]
async fn test_teardown_closes_everything() {
    let env = TestEnv::new();
    let mut registry = env.registry();

    registry.open("a.db", &OpenOptions::default()).await.unwrap();
    registry.open("b.db", &OpenOptions::default()).await.unwrap();
    assert_eq!(registry.len(), 2);

    registry.teardown();
    assert!(registry.is_empty());
    registry.teardown();
    assert!(registry.is_empty());
}
