// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Request and response types of the host bridge.
//!
//! Requests arrive as JSON dictionaries of the form
//! `{"method": "...", "args": {...}}`; every request is answered with
//! either `{"status": "success", "result": ...}` or
//! `{"status": "error", "error": "..."}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use sqlbridge_db::SqlStatement;
use sqlbridge_db::codec;

use crate::error::SessionError;
use crate::registry::OpenOptions;

/// A host request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "args", rename_all = "camelCase")]
pub enum Request {
    Open(OpenArgs),
    Close(PathArgs),
    Delete(PathArgs),
    Attach(AttachArgs),
    #[serde(alias = "backgroundExecuteSqlBatch")]
    ExecuteSqlBatch(BatchArgs),
    EchoStringValue(EchoArgs),
}

impl Request {
    /// Method name, for logging.
    pub fn method(&self) -> &'static str {
        match self {
            Request::Open(_) => "open",
            Request::Close(_) => "close",
            Request::Delete(_) => "delete",
            Request::Attach(_) => "attach",
            Request::ExecuteSqlBatch(_) => "executeSqlBatch",
            Request::EchoStringValue(_) => "echoStringValue",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OpenArgs {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_filename: Option<String>,
    pub read_only: bool,
}

impl OpenArgs {
    pub fn options(&self) -> OpenOptions {
        OpenOptions {
            asset: self.asset_filename.clone(),
            read_only: self.read_only,
        }
    }
}

/// Arguments of `close` and `delete`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathArgs {
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AttachArgs {
    pub path: Option<String>,
    pub db_alias: Option<String>,
    pub db_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbArgs {
    pub dbname: String,
}

/// Arguments of `executeSqlBatch`.
///
/// The database may be named directly (`dbname`) or nested under
/// `dbargs`, as older hosts send it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchArgs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dbname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dbargs: Option<DbArgs>,
    pub executes: Vec<QueryArgs>,
}

impl BatchArgs {
    pub fn database_name(&self) -> Option<&str> {
        self.dbname
            .as_deref()
            .or(self.dbargs.as_ref().map(|args| args.dbname.as_str()))
            .filter(|name| !name.is_empty())
    }

    /// Statements in submission order, parameters converted for binding.
    pub fn statements(&self) -> Vec<SqlStatement> {
        self.executes
            .iter()
            .map(|query| SqlStatement {
                id: query.qid,
                sql: query.sql.clone(),
                params: codec::to_binds(&query.params),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryArgs {
    pub qid: i64,
    pub sql: String,
    pub params: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EchoArgs {
    pub value: String,
}

/// Answer to a request: the success or failure arm of the host callback pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Response {
    Success { result: Value },
    Error { error: String },
}

impl Response {
    pub fn success<T: Serialize>(result: &T) -> Self {
        match serde_json::to_value(result) {
            Ok(result) => Response::Success { result },
            Err(e) => Response::error(format!("Failed to encode result: {e}")),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Response::Error {
            error: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success { .. })
    }
}

impl<T: Serialize> From<Result<T, SessionError>> for Response {
    fn from(result: Result<T, SessionError>) -> Self {
        match result {
            Ok(value) => Response::success(&value),
            Err(e) => Response::error(e.to_string()),
        }
    }
}
