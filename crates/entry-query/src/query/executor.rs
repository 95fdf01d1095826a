//! Query execution backends.
//!
//! Provides the executor trait the filter pass runs relation subqueries
//! through, and a PostgreSQL implementation.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sea_query::Value;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use tracing::debug;

use super::EntryQuery;
use crate::config::DatabaseConfig;
use crate::db;

/// Executes an [`EntryQuery`] and returns its rows.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Run the query and collect every row as a JSON object.
    async fn fetch(&self, query: &EntryQuery) -> Result<ResultSet>;
}

/// Rows returned by a query, one JSON object per row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    rows: Vec<JsonValue>,
}

impl ResultSet {
    pub fn new(rows: Vec<JsonValue>) -> Self {
        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[JsonValue] {
        &self.rows
    }

    /// Extract one column's values, in row order.
    ///
    /// Rows where the column is missing or NULL are skipped.
    pub fn pluck(&self, column: &str) -> Vec<Value> {
        self.rows
            .iter()
            .filter_map(|row| row.get(column))
            .filter_map(json_to_value)
            .collect()
    }
}

/// Convert a scalar JSON value into a bindable SQL value.
fn json_to_value(value: &JsonValue) -> Option<Value> {
    match value {
        JsonValue::String(s) => Some(Value::from(s.clone())),
        JsonValue::Number(n) => n
            .as_i64()
            .map(Value::from)
            .or_else(|| n.as_f64().map(Value::from)),
        JsonValue::Bool(b) => Some(Value::from(*b)),
        _ => None,
    }
}

/// PostgreSQL executor.
///
/// Each query runs in its own transaction with `SET LOCAL statement_timeout`
/// so the timeout resets on commit.
pub struct PgQueryExecutor {
    pool: PgPool,
    statement_timeout: Duration,
}

impl PgQueryExecutor {
    /// Create an executor with a 10 second statement timeout.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            statement_timeout: Duration::from_secs(10),
        }
    }

    /// Connect a new pool from configuration.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = db::create_pool(config).await?;
        Ok(Self::new(pool).with_statement_timeout(config.statement_timeout))
    }

    pub fn with_statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = timeout;
        self
    }
}

#[async_trait]
impl QueryExecutor for PgQueryExecutor {
    async fn fetch(&self, query: &EntryQuery) -> Result<ResultSet> {
        let sql = query.to_sql();
        let wrapped = format!("SELECT row_to_json(t) FROM ({sql}) t");
        let timeout = format!(
            "SET LOCAL statement_timeout = '{}ms'",
            self.statement_timeout.as_millis()
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to begin transaction")?;

        sqlx::query(&timeout)
            .execute(&mut *tx)
            .await
            .context("failed to set statement timeout")?;

        let rows: Vec<JsonValue> = sqlx::query_scalar(&wrapped)
            .fetch_all(&mut *tx)
            .await
            .with_context(|| format!("failed to execute query on '{}'", query.table_name()))?;

        tx.commit()
            .await
            .context("failed to commit query transaction")?;

        debug!(table = %query.table_name(), rows = rows.len(), "executed entry query");
        Ok(ResultSet::new(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pluck_extracts_column_values() {
        let rows = ResultSet::new(vec![
            json!({"id": 7, "name": "Jane"}),
            json!({"id": 9, "name": "Janet"}),
        ]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows.pluck("id"), vec![Value::from(7_i64), Value::from(9_i64)]);
        assert_eq!(
            rows.pluck("name"),
            vec![
                Value::from("Jane".to_string()),
                Value::from("Janet".to_string())
            ]
        );
    }

    #[test]
    fn pluck_skips_missing_and_null() {
        let rows = ResultSet::new(vec![
            json!({"id": 7}),
            json!({"id": null}),
            json!({"other": 1}),
        ]);
        assert_eq!(rows.pluck("id"), vec![Value::from(7_i64)]);
        assert!(rows.pluck("missing").is_empty());
    }

    #[test]
    fn empty_result_set() {
        let rows = ResultSet::default();
        assert!(rows.is_empty());
        assert!(rows.pluck("id").is_empty());
    }
}
