//! Database connection and query execution for dbchat.
//!
//! Wraps a single long-lived SQLite connection: catalog lookups used by the
//! schema introspector, plus the model-facing query executor whose output is
//! always a string the model can read, never a raised error.

use std::path::Path;
use std::str::FromStr;

use serde_json::Value;
use sqlx::decode::Decode;
use sqlx::sqlite::{Sqlite, SqliteConnectOptions, SqlitePoolOptions, SqliteRow, SqliteValueRef};
use sqlx::{Column, Row, SqlitePool, TypeInfo, ValueRef};

use crate::error::{Error, Result};

/// Message returned when a query matches no rows. JSON-encoded so the model
/// can distinguish "no data matched" from an empty result structure.
pub const NO_RESULTS_MESSAGE: &str = "The query returned no results. Try a different question.";

/// Handle to the sales database.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open an existing database. Fails with a clear diagnostic when the
    /// file is missing; seeding must happen before a session starts.
    pub async fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(format!(
                "database file not found at {} (run `dbchat seed` first)",
                path.display()
            )));
        }
        Self::connect(path, false).await
    }

    /// Open a database, creating the file if missing. Used by the seeder.
    pub async fn create(path: &Path) -> Result<Self> {
        let parent = path.parent().unwrap_or(Path::new("."));
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
        Self::connect(path, true).await
    }

    async fn connect(path: &Path, create_if_missing: bool) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
            .create_if_missing(create_if_missing)
            .foreign_keys(true);

        // One connection: tool calls within a round are dispatched
        // sequentially against this single shared handle.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Get the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database.
    pub async fn close(self) {
        self.pool.close().await;
    }

    /// All user-defined table names, excluding SQLite internals.
    pub async fn table_names(&self) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .filter_map(|row| row.try_get::<String, _>("name").ok())
            .collect())
    }

    /// Check whether a table exists.
    pub async fn table_exists(&self, table: &str) -> Result<bool> {
        let row = sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(table)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Check whether a column exists on the given table.
    pub async fn column_exists(&self, table: &str, column: &str) -> Result<bool> {
        let rows = sqlx::query(&format!("PRAGMA table_info({table})"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .iter()
            .filter_map(|row| row.try_get::<String, _>("name").ok())
            .any(|name| name == column))
    }

    /// Sorted distinct non-null values of a column, after validating that
    /// the table and column exist. Identifiers come from the catalog or the
    /// fixed domain map, not from user input.
    pub async fn distinct_values(&self, table: &str, column: &str) -> Result<Vec<String>> {
        if !self.table_exists(table).await? {
            return Err(Error::NotFound(format!("table '{table}' does not exist")));
        }
        if !self.column_exists(table, column).await? {
            return Err(Error::NotFound(format!(
                "column '{column}' does not exist in table '{table}'"
            )));
        }

        let rows = sqlx::query(&format!(
            "SELECT DISTINCT {column} FROM {table} WHERE {column} IS NOT NULL ORDER BY {column}"
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut values = Vec::with_capacity(rows.len());
        for row in &rows {
            match decode_value(row.try_get_raw(0)?) {
                Value::Null => {}
                Value::String(s) if s.is_empty() => {}
                Value::String(s) => values.push(s),
                other => values.push(other.to_string()),
            }
        }
        Ok(values)
    }

    /// Min/max of a numeric column, or None when the table is empty.
    pub async fn numeric_range(&self, table: &str, column: &str) -> Result<Option<(f64, f64)>> {
        let row = sqlx::query(&format!("SELECT MIN({column}), MAX({column}) FROM {table}"))
            .fetch_one(&self.pool)
            .await?;

        let min: Option<f64> = row.try_get(0)?;
        let max: Option<f64> = row.try_get(1)?;
        Ok(min.zip(max))
    }

    /// Distinct calendar years present in a date column, ascending.
    pub async fn distinct_years(&self, table: &str, column: &str) -> Result<Vec<String>> {
        let rows = sqlx::query(&format!(
            "SELECT DISTINCT strftime('%Y', {column}) AS year FROM {table} \
             WHERE {column} IS NOT NULL ORDER BY year"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .filter_map(|row| row.try_get::<Option<String>, _>("year").ok().flatten())
            .collect())
    }

    /// Execute an arbitrary read query and encode the outcome as a string.
    ///
    /// Success with rows yields `{"columns": [...], "data": [[...], ...]}`
    /// preserving engine column and row order; zero rows yields a
    /// JSON-encoded human message; failure yields a JSON object carrying
    /// the error text and the offending query so the model can correct
    /// itself on the next turn.
    pub async fn execute_query(&self, query: &str) -> String {
        tracing::debug!(query, "executing sales query");
        match self.run_query(query).await {
            Ok(encoded) => encoded,
            Err(err) => serde_json::json!({
                "error": err.to_string(),
                "query": query,
            })
            .to_string(),
        }
    }

    async fn run_query(&self, query: &str) -> Result<String> {
        let rows = sqlx::query(query).fetch_all(&self.pool).await?;

        if rows.is_empty() {
            return Ok(serde_json::to_string(NO_RESULTS_MESSAGE)?);
        }

        let columns: Vec<String> = rows[0]
            .columns()
            .iter()
            .map(|col| col.name().to_string())
            .collect();

        let mut data = Vec::with_capacity(rows.len());
        for row in &rows {
            data.push(Value::Array(row_values(row, columns.len())?));
        }

        Ok(serde_json::json!({
            "columns": columns,
            "data": data,
        })
        .to_string())
    }
}

fn row_values(row: &SqliteRow, width: usize) -> Result<Vec<Value>> {
    let mut values = Vec::with_capacity(width);
    for idx in 0..width {
        values.push(decode_value(row.try_get_raw(idx)?));
    }
    Ok(values)
}

/// Decode a raw SQLite value by its storage class into JSON.
fn decode_value(raw: SqliteValueRef<'_>) -> Value {
    if raw.is_null() {
        return Value::Null;
    }

    match raw.type_info().name() {
        "INTEGER" | "BOOLEAN" => <i64 as Decode<Sqlite>>::decode(raw)
            .map(Value::from)
            .unwrap_or(Value::Null),
        "REAL" => <f64 as Decode<Sqlite>>::decode(raw)
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        "BLOB" => <&[u8] as Decode<Sqlite>>::decode(raw)
            .map(|bytes| Value::from(format!("<blob: {} bytes>", bytes.len())))
            .unwrap_or(Value::Null),
        _ => <String as Decode<Sqlite>>::decode(raw)
            .map(Value::from)
            .unwrap_or(Value::Null),
    }
}
