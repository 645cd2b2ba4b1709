// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Serialization queue for database session operations.
//!
//! All operations against a registry are funnelled through one FIFO queue
//! drained by a single worker task, so open/close/delete and batch
//! execution never interleave. Two concurrent opens of the same path are
//! linearized and the second one observes the first one's connection.
//!
//! Blocking native work is shipped to the blocking thread pool while the
//! worker waits for it; the worker never starts the next operation before
//! the current one has completed.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::{Mutex, MutexGuard, mpsc, oneshot};
use tracing::{debug, error, trace};

use crate::error::{Result, SessionError};
use crate::paths::PathResolver;
use crate::registry::ConnectionRegistry;

type Operation<R> = Box<dyn FnOnce(Session<R>) -> BoxFuture<'static, ()> + Send>;

enum Message<R> {
    Run(Operation<R>),
    Shutdown(oneshot::Sender<()>),
}

/// Access to the registry handed to queued operations.
///
/// Only the queue worker ever holds a `Session`, so locking never contends.
pub struct Session<R> {
    registry: Arc<Mutex<ConnectionRegistry<R>>>,
}

impl<R> Clone for Session<R> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<R: PathResolver> Session<R> {
    /// Lock the registry for async work (provisioning, file removal).
    pub async fn registry(&self) -> MutexGuard<'_, ConnectionRegistry<R>> {
        self.registry.lock().await
    }

    /// Run blocking native work against the registry on the blocking pool.
    pub async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut ConnectionRegistry<R>) -> T + Send + 'static,
    {
        let registry = Arc::clone(&self.registry);
        tokio::task::spawn_blocking(move || {
            let mut registry = registry.blocking_lock();
            f(&mut registry)
        })
        .await
        .map_err(|e| SessionError::OperationPanicked(format!("Task join error: {e}")))
    }
}

/// Single-consumer FIFO queue owning a [`ConnectionRegistry`].
///
/// Cloning the queue yields another submitter for the same worker.
pub struct SessionQueue<R> {
    tx: mpsc::UnboundedSender<Message<R>>,
}

impl<R> Clone for SessionQueue<R> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<R: PathResolver> SessionQueue<R> {
    /// Start the worker for `registry`. Must be called within a tokio runtime.
    pub fn new(registry: ConnectionRegistry<R>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Session {
            registry: Arc::new(Mutex::new(registry)),
        };
        tokio::spawn(drain(session, rx));
        Self { tx }
    }

    /// Enqueue an operation and wait for its result.
    ///
    /// Operations run strictly in submission order, one at a time.
    pub async fn submit<T, F, Fut>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(Session<R>) -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let operation: Operation<R> = Box::new(move |session| {
            async move {
                let output = op(session).await;
                // The submitter may have gone away; the work is done regardless.
                let _ = reply_tx.send(output);
            }
            .boxed()
        });

        self.tx
            .send(Message::Run(operation))
            .map_err(|_| SessionError::QueueClosed)?;
        reply_rx.await.map_err(|_| {
            SessionError::OperationPanicked("operation aborted before completing".to_string())
        })
    }

    /// Stop accepting operations, finish the queued ones and close every
    /// connection.
    pub async fn shutdown(&self) -> Result<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(Message::Shutdown(ack_tx))
            .map_err(|_| SessionError::QueueClosed)?;
        // The worker drops the ack only if it died, which still means it is down.
        let _ = ack_rx.await;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

async fn drain<R: PathResolver>(session: Session<R>, mut rx: mpsc::UnboundedReceiver<Message<R>>) {
    debug!("Session queue worker started");
    let mut acks = Vec::new();

    while let Some(message) = rx.recv().await {
        match message {
            Message::Run(operation) => run_operation(&session, operation).await,
            Message::Shutdown(ack) => {
                // Already queued operations still run; new submissions fail.
                rx.close();
                acks.push(ack);
            }
        }
    }

    session.registry().await.teardown();
    debug!("Session queue worker stopped");
    for ack in acks {
        let _ = ack.send(());
    }
}

async fn run_operation<R: PathResolver>(session: &Session<R>, operation: Operation<R>) {
    let session = session.clone();
    trace!("Running queued operation");
    let result = AssertUnwindSafe(async move { operation(session).await })
        .catch_unwind()
        .await;
    if let Err(panic) = result {
        error!("Queued operation panicked: {}", panic_message(&*panic));
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
