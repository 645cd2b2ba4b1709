// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Value and outcome types exchanged with the batch executor.

use std::collections::BTreeMap;

use rusqlite::ToSql;
use rusqlite::types::{ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// A value bound to a positional `?` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Null,
    /// Stored as integer 0 or 1
    Boolean(bool),
    Integer(i64),
    Double(f64),
    Text(String),
    /// Textual rendering of a value with no SQL counterpart
    BestEffortText(String),
}

impl ToSql for BindValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            BindValue::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            BindValue::Boolean(b) => ToSqlOutput::Borrowed(ValueRef::Integer(i64::from(*b))),
            BindValue::Integer(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
            BindValue::Double(f) => ToSqlOutput::Borrowed(ValueRef::Real(*f)),
            BindValue::Text(s) | BindValue::BestEffortText(s) => {
                ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes()))
            }
        })
    }
}

impl From<bool> for BindValue {
    fn from(b: bool) -> Self {
        BindValue::Boolean(b)
    }
}

impl From<i64> for BindValue {
    fn from(i: i64) -> Self {
        BindValue::Integer(i)
    }
}

impl From<f64> for BindValue {
    fn from(f: f64) -> Self {
        BindValue::Double(f)
    }
}

impl From<&str> for BindValue {
    fn from(s: &str) -> Self {
        BindValue::Text(s.to_owned())
    }
}

impl From<String> for BindValue {
    fn from(s: String) -> Self {
        BindValue::Text(s)
    }
}

/// A value read back from a result column.
///
/// Blobs cannot cross the JSON boundary, so they are carried as base64 text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnValue {
    Null,
    Integer(i64),
    Double(f64),
    Text(String),
    Base64Blob(String),
}

impl ColumnValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ColumnValue::Null)
    }
}

/// One result row keyed by column name. Null columns are left out.
pub type Row = BTreeMap<String, ColumnValue>;

/// A single statement of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    /// Caller supplied identifier, echoed back in the outcome
    pub id: i64,
    pub sql: String,
    /// Positional parameters, bound starting at index 1
    pub params: Vec<BindValue>,
}

impl SqlStatement {
    pub fn new(id: i64, sql: impl Into<String>) -> Self {
        Self {
            id,
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params(mut self, params: impl IntoIterator<Item = BindValue>) -> Self {
        self.params = params.into_iter().collect();
        self
    }
}

/// Rows and bookkeeping of a statement that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSet {
    pub rows: Vec<Row>,
    pub rows_affected: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert_id: Option<i64>,
}

/// Outcome of one statement.
#[derive(Debug, Clone, PartialEq)]
pub enum StatementOutcome {
    Success(ResultSet),
    Failure(String),
}

impl StatementOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, StatementOutcome::Success(_))
    }

    pub fn failure(message: impl Into<String>) -> Self {
        StatementOutcome::Failure(message.into())
    }
}

/// Wire form of a statement outcome, tagged with its `qid`.
///
/// Failures carry the message in both `error` and `result`; clients
/// predating the `error` field read `result`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum QueryResult {
    Success {
        qid: i64,
        result: ResultSet,
    },
    Error {
        qid: i64,
        error: String,
        result: String,
    },
}

impl QueryResult {
    pub fn new(qid: i64, outcome: StatementOutcome) -> Self {
        match outcome {
            StatementOutcome::Success(result) => QueryResult::Success { qid, result },
            StatementOutcome::Failure(message) => QueryResult::Error {
                qid,
                result: message.clone(),
                error: message,
            },
        }
    }

    pub fn qid(&self) -> i64 {
        match self {
            QueryResult::Success { qid, .. } | QueryResult::Error { qid, .. } => *qid,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, QueryResult::Success { .. })
    }
}
