// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

use serde_json::Value;
use tracing::{debug, instrument};

use sqlbridge_db::{QueryResult, SqlStatement, execute_batch};

use crate::error::{Result, SessionError, usage};
use crate::paths::PathResolver;
use crate::protocol::{BatchArgs, OpenArgs, Request, Response};
use crate::queue::SessionQueue;
use crate::registry::{ConnectionRegistry, OpenOptions};

pub const OPENED: &str = "Database opened";
pub const CLOSED: &str = "DB Closed";
pub const DELETED: &str = "Database Deleted";

/// The method surface exposed to the host.
///
/// Every method is funnelled through one [`SessionQueue`], so requests are
/// answered in the order they were submitted.
pub struct SessionHandler<R> {
    queue: SessionQueue<R>,
}

impl<R> Clone for SessionHandler<R> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
        }
    }
}

impl<R: PathResolver> SessionHandler<R> {
    /// Start a handler with an empty registry. Must be called within a tokio runtime.
    pub fn new(resolver: R) -> Self {
        Self {
            queue: SessionQueue::new(ConnectionRegistry::new(resolver)),
        }
    }

    pub fn queue(&self) -> &SessionQueue<R> {
        &self.queue
    }

    #[instrument(skip(self, options))]
    pub async fn open(&self, name: String, options: OpenOptions) -> Result<&'static str> {
        self.queue
            .submit(move |session| async move {
                session.registry().await.open(&name, &options).await?;
                Ok::<_, SessionError>(OPENED)
            })
            .await?
    }

    #[instrument(skip(self))]
    pub async fn close(&self, path: String) -> Result<&'static str> {
        self.queue
            .submit(move |session| async move {
                session
                    .blocking(move |registry| registry.close(&path))
                    .await??;
                Ok::<_, SessionError>(CLOSED)
            })
            .await?
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, path: String) -> Result<&'static str> {
        self.queue
            .submit(move |session| async move {
                session.registry().await.delete(&path).await?;
                Ok::<_, SessionError>(DELETED)
            })
            .await?
    }

    /// Attaching another database is not supported.
    pub async fn attach(&self) -> Result<&'static str> {
        self.queue
            .submit(|_| async { Err(SessionError::AttachUnsupported) })
            .await?
    }

    /// Run a batch against an open database.
    ///
    /// The request fails as a whole only when the database is missing or not
    /// open; statement failures are reported per statement.
    #[instrument(skip(self, statements), fields(statements = statements.len()))]
    pub async fn execute_sql_batch(
        &self,
        dbname: String,
        statements: Vec<SqlStatement>,
    ) -> Result<Vec<QueryResult>> {
        self.queue
            .submit(move |session| async move {
                if dbname.is_empty() {
                    return Err(SessionError::Usage(usage::BATCH_PATH));
                }
                session
                    .blocking(move |registry| {
                        let connection = registry
                            .lookup(&dbname)
                            .ok_or(SessionError::NoSuchDatabase)?;
                        Ok(execute_batch(connection.handle(), &statements))
                    })
                    .await?
            })
            .await?
    }

    /// Returns `value` unchanged, after every operation queued before it.
    pub async fn echo_string_value(&self, value: String) -> Result<String> {
        self.queue.submit(move |_| async move { value }).await
    }

    /// Answer one decoded host request.
    pub async fn dispatch(&self, request: Request) -> Response {
        debug!("Dispatching {}", request.method());
        match request {
            Request::Open(args) => self.handle_open(args).await.into(),
            Request::Close(args) => self.close(args.path).await.into(),
            Request::Delete(args) => self.delete(args.path).await.into(),
            Request::Attach(_) => self.attach().await.into(),
            Request::ExecuteSqlBatch(args) => self.handle_batch(args).await.into(),
            Request::EchoStringValue(args) => self.echo_string_value(args.value).await.into(),
        }
    }

    /// Decode a raw JSON request and answer it.
    pub async fn dispatch_value(&self, request: Value) -> Response {
        match serde_json::from_value::<Request>(request) {
            Ok(request) => self.dispatch(request).await,
            Err(e) => Response::error(format!("Invalid request: {e}")),
        }
    }

    /// Finish queued work and close every connection.
    pub async fn shutdown(&self) -> Result<()> {
        self.queue.shutdown().await
    }

    async fn handle_open(&self, args: OpenArgs) -> Result<&'static str> {
        let options = args.options();
        self.open(args.name, options).await
    }

    async fn handle_batch(&self, args: BatchArgs) -> Result<Vec<QueryResult>> {
        let statements = args.statements();
        let dbname = args.database_name().unwrap_or_default().to_string();
        self.execute_sql_batch(dbname, statements).await
    }
}
