// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Batch execution against a single connection.
//!
//! Every statement of a batch produces exactly one outcome, in submission
//! order. A failing statement never aborts the rest of the batch.

use tracing::{debug, trace, warn};

use crate::connection::{DbHandle, PreparedStatement, Step};
use crate::error::Result;
use crate::types::{ColumnValue, QueryResult, ResultSet, Row, SqlStatement, StatementOutcome};

/// Message for a statement with no SQL text.
pub const EMPTY_SQL_MESSAGE: &str = "you must specify a sql query to execute";

/// Run every statement of a batch, returning one tagged result per statement.
pub fn execute_batch(db: &DbHandle, statements: &[SqlStatement]) -> Vec<QueryResult> {
    debug!(
        "Executing batch of {} statement(s) on {}",
        statements.len(),
        db.path().display()
    );
    statements
        .iter()
        .map(|statement| QueryResult::new(statement.id, execute_statement(db, statement)))
        .collect()
}

/// Run a single statement to completion.
pub fn execute_statement(db: &DbHandle, statement: &SqlStatement) -> StatementOutcome {
    if statement.sql.trim().is_empty() {
        return StatementOutcome::failure(EMPTY_SQL_MESSAGE);
    }

    let mut stmt = match db.prepare(&statement.sql) {
        Ok(Some(stmt)) => stmt,
        Ok(None) => return StatementOutcome::failure(EMPTY_SQL_MESSAGE),
        Err(e) => {
            debug!("qid {}: prepare failed: {e}", statement.id);
            return StatementOutcome::Failure(e.driver_message());
        }
    };

    let outcome = match run_prepared(db, &mut stmt, statement) {
        Ok(result) => StatementOutcome::Success(result),
        Err(e) => {
            debug!("qid {}: execution failed: {e}", statement.id);
            StatementOutcome::Failure(e.driver_message())
        }
    };

    if let Err(e) = stmt.finalize() {
        trace!("qid {}: finalize reported: {e}", statement.id);
    }
    outcome
}

fn run_prepared(
    db: &DbHandle,
    stmt: &mut PreparedStatement<'_>,
    statement: &SqlStatement,
) -> Result<ResultSet> {
    bind_params(stmt, statement);

    let changes_before = db.total_changes()?;
    let mut rows = Vec::new();
    let mut cursor = stmt.cursor();
    loop {
        match cursor.step()? {
            Step::Row(values) => rows.push(sparse_row(values)),
            Step::Done => break,
        }
    }
    drop(cursor);

    let rows_affected = db.total_changes()? - changes_before;
    let last_insert_id = db.last_insert_id();
    // Only report an id the statement itself produced, never a stale one.
    let insert_id = (rows_affected > 0 && last_insert_id != 0).then_some(last_insert_id);

    trace!(
        "qid {}: {} row(s), {} affected, insert id {:?}",
        statement.id,
        rows.len(),
        rows_affected,
        insert_id
    );
    Ok(ResultSet {
        rows,
        rows_affected,
        insert_id,
    })
}

/// Bind parameters in order. Binding never fails the statement: surplus
/// parameters are dropped and missing ones stay null.
fn bind_params(stmt: &mut PreparedStatement<'_>, statement: &SqlStatement) {
    let placeholders = stmt.parameter_count();
    if statement.params.len() > placeholders {
        debug!(
            "qid {}: ignoring {} parameter(s) beyond {} placeholder(s)",
            statement.id,
            statement.params.len() - placeholders,
            placeholders
        );
    }
    for (i, param) in statement.params.iter().take(placeholders).enumerate() {
        if let Err(e) = stmt.bind(i + 1, param) {
            warn!("qid {}: binding parameter {} failed: {e}", statement.id, i + 1);
        }
    }
}

/// Build a row map, leaving out null columns.
fn sparse_row(values: Vec<(String, ColumnValue)>) -> Row {
    values
        .into_iter()
        .filter(|(_, value)| !value.is_null())
        .collect()
}
