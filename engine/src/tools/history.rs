//! Workout history query tool
//!
//! Executes one externally supplied read-only SQL string against the workout
//! store. Admission is a prefix check: the trimmed, lowercased query must
//! start with `select`. This blocks obviously destructive statements; it is
//! not a SQL parser and will not catch destructive semantics dressed up as a
//! `select`. The connection is additionally opened read-only as a second
//! layer for anything that slips through.
//!
//! The connection is opened and released around the single call. It never
//! survives past the tool step, and the tool holds no pool.

use sdk::errors::EngineError;
use serde_json::Value;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Connection, Row, TypeInfo, ValueRef};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read-only query access to the workout store.
pub struct HistoryQueryTool {
    db_path: PathBuf,
}

impl HistoryQueryTool {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    /// Execute a `select` statement verbatim and return its rows.
    ///
    /// Each row comes back as a JSON array of column values. Aggregate
    /// queries over an empty table produce a single all-NULL row in SQLite;
    /// those are reported as no rows so the model sees "no history" instead
    /// of `[[null]]`.
    ///
    /// # Errors
    ///
    /// - `EngineError::WriteQueryRejected` if the query does not start with
    ///   `select` (case/whitespace-insensitive). The store is not touched.
    /// - `EngineError::QueryFailed` for any execution failure, carrying the
    ///   underlying database message. Not retried here.
    pub async fn query(&self, query: &str) -> Result<Vec<Vec<Value>>, EngineError> {
        let trimmed = query.trim();
        if !trimmed.to_lowercase().starts_with("select") {
            return Err(EngineError::WriteQueryRejected(trimmed.to_string()));
        }

        debug!(query = trimmed, "executing history query");

        let options = SqliteConnectOptions::new()
            .filename(&self.db_path)
            .read_only(true);

        let mut conn = options
            .connect()
            .await
            .map_err(|e| EngineError::QueryFailed(e.to_string()))?;

        let result = sqlx::query(trimmed)
            .fetch_all(&mut conn)
            .await
            .map_err(|e| EngineError::QueryFailed(e.to_string()));

        // Released before the conversation resumes
        let _ = conn.close().await;

        let rows = result?;

        let mut values = Vec::with_capacity(rows.len());
        for row in &rows {
            let columns = row.columns().len();
            let mut record = Vec::with_capacity(columns);
            for idx in 0..columns {
                record.push(Self::value_at(row, idx));
            }
            // SQLite renders aggregates over zero rows as one all-NULL row
            if !record.iter().all(Value::is_null) {
                values.push(record);
            }
        }

        Ok(values)
    }

    fn value_at(row: &sqlx::sqlite::SqliteRow, idx: usize) -> Value {
        let Ok(raw) = row.try_get_raw(idx) else {
            return Value::Null;
        };
        if raw.is_null() {
            return Value::Null;
        }

        match raw.type_info().name() {
            "INTEGER" => row
                .try_get::<i64, _>(idx)
                .map(Value::from)
                .unwrap_or(Value::Null),
            "REAL" => row
                .try_get::<f64, _>(idx)
                .map(Value::from)
                .unwrap_or(Value::Null),
            _ => row
                .try_get::<String, _>(idx)
                .map(Value::from)
                .unwrap_or(Value::Null),
        }
    }
}
