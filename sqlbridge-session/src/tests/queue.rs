// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Tests for the serialization queue.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::join_all;

use super::test_env::TestEnv;
use crate::error::SessionError;
use crate::queue::SessionQueue;
use crate::registry::OpenOptions;

#[test_log::test(tokio::test)]
async fn test_operations_run_in_submission_order() {
    let env = TestEnv::new();
    let queue = SessionQueue::new(env.registry());
    let log = Arc::new(Mutex::new(Vec::new()));

    let submissions = (0..16u64).map(|i| {
        let log = Arc::clone(&log);
        queue.submit(move |_| async move {
            // Earlier operations take longer; order must still hold.
            tokio::time::sleep(Duration::from_millis(16 - i)).await;
            log.lock().unwrap().push(i);
            i
        })
    });
    let results: Vec<u64> = join_all(submissions)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();

    let expected: Vec<u64> = (0..16).collect();
    assert_eq!(results, expected);
    assert_eq!(*log.lock().unwrap(), expected);
}

/// A panicking operation fails its caller only.
#[test_log::test(tokio::test)]
async fn test_panic_does_not_stall_queue() {
    let env = TestEnv::new();
    let queue = SessionQueue::new(env.registry());

    let err = queue
        .submit::<(), _, _>(|_| async { panic!("boom") })
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::OperationPanicked(_)));

    let value = queue.submit(|_| async { 42 }).await.unwrap();
    assert_eq!(value, 42);
}

#[test_log::test(tokio::test)]
async fn test_panic_in_blocking_work() {
    let env = TestEnv::new();
    let queue = SessionQueue::new(env.registry());

    let result = queue
        .submit(|session| async move {
            session
                .blocking(|_| -> usize { panic!("native failure") })
                .await
        })
        .await
        .unwrap();
    assert!(matches!(result, Err(SessionError::OperationPanicked(_))));

    // The registry mutex is not poisoned for later operations.
    let len = queue
        .submit(|session| async move { session.blocking(|registry| registry.len()).await })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(len, 0);
}

/// Operations queued before shutdown still run; later ones are rejected.
#[test_log::test(tokio::test)]
async fn test_shutdown_drains_then_closes() {
    let env = TestEnv::new();
    let queue = SessionQueue::new(env.registry());

    let pending = queue.submit(|session| async move {
        session
            .registry()
            .await
            .open("t.db", &OpenOptions::default())
            .await
    });
    let (opened, shut) = tokio::join!(pending, queue.shutdown());
    opened.unwrap().unwrap();
    shut.unwrap();

    assert!(queue.is_closed());
    let err = queue.submit(|_| async {}).await.unwrap_err();
    assert!(matches!(err, SessionError::QueueClosed));
    assert!(matches!(
        queue.shutdown().await,
        Err(SessionError::QueueClosed)
    ));
}
