// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Conversions between dynamic host values and SQLite values.
//!
//! Neither direction can fail: unknown parameter types degrade to their
//! textual form and unknown column types read back as null.

use data_encoding::BASE64;
use rusqlite::types::ValueRef;
use serde_json::Value;

use crate::types::{BindValue, ColumnValue};

/// Convert a dynamic parameter into a bind value.
pub fn to_bind(value: &Value) -> BindValue {
    match value {
        Value::Null => BindValue::Null,
        Value::Bool(b) => BindValue::Boolean(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => BindValue::Integer(i),
            // u64 beyond i64::MAX or a real number
            None => n
                .as_f64()
                .map(BindValue::Double)
                .unwrap_or_else(|| BindValue::BestEffortText(n.to_string())),
        },
        Value::String(s) => BindValue::Text(s.clone()),
        other => BindValue::BestEffortText(other.to_string()),
    }
}

/// Convert every parameter of a statement, preserving order.
pub fn to_binds(values: &[Value]) -> Vec<BindValue> {
    values.iter().map(to_bind).collect()
}

/// Convert a native column value into a caller-safe value.
pub fn from_column(value: ValueRef<'_>) -> ColumnValue {
    match value {
        ValueRef::Null => ColumnValue::Null,
        ValueRef::Integer(i) => ColumnValue::Integer(i),
        ValueRef::Real(f) => ColumnValue::Double(f),
        ValueRef::Text(bytes) => ColumnValue::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => ColumnValue::Base64Blob(encode_blob(bytes)),
    }
}

/// Base64 form used for blob columns.
pub fn encode_blob(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

/// Inverse of [`encode_blob`], for callers that need the raw bytes back.
pub fn decode_blob(encoded: &str) -> Result<Vec<u8>, data_encoding::DecodeError> {
    BASE64.decode(encoded.as_bytes())
}
