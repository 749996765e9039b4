//! SQLite database client implementation.
//!
//! Provides the `SqliteClient` struct that implements the `DatabaseClient` trait
//! for SQLite files and in-memory databases using sqlx.

use super::{map_execute_error, row_columns, statement_columns, ColumnInfo};
use crate::config::ConnectionConfig;
use crate::db::{DatabaseBackend, DatabaseClient, QueryResult, Row, Value};
use crate::error::{Error, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column as SqlxColumn, Executor, Row as SqlxRow, Statement, TypeInfo, ValueRef};
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::debug;

/// How long to wait on a locked database file.
const BUSY_TIMEOUT_SECS: u64 = 5;

/// SQLite database client.
///
/// Uses a single connection that is never recycled, so an in-memory database
/// lives exactly as long as the client. Queries never commit; only
/// `execute_script` writes.
#[derive(Debug)]
pub struct SqliteClient {
    pool: SqlitePool,
}

impl SqliteClient {
    /// Opens the database file (or `:memory:`) named by `config.database`.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let conn_str = config.to_connection_string()?;
        debug!("Opening {}", config.display_string());

        let options = SqliteConnectOptions::from_str(&conn_str)
            .map_err(|e| Error::config(format!("Invalid SQLite database '{conn_str}': {e}")))?
            .busy_timeout(Duration::from_secs(BUSY_TIMEOUT_SECS));

        // An explicit `mode=` decides whether a missing file is created
        let options = match config.option("mode") {
            Some(_) => options,
            None => options.create_if_missing(true),
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| Error::connection(format!("Failed to open SQLite database: {e}")))?;

        Ok(Self { pool })
    }

    /// Opens a fresh, empty in-memory database.
    pub async fn in_memory() -> Result<Self> {
        Self::connect(&ConnectionConfig::sqlite(":memory:")).await
    }

    /// Creates a new SqliteClient from an existing connection pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Column metadata for a statement that produced no rows.
    async fn describe_columns(&self, sql: &str) -> Vec<ColumnInfo> {
        match (&self.pool).prepare(sql).await {
            Ok(statement) => statement_columns(statement.columns()),
            Err(_) => Vec::new(),
        }
    }
}

#[async_trait]
impl DatabaseClient for SqliteClient {
    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::Sqlite
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        let start = Instant::now();

        // Every query runs in a transaction that is rolled back, so text
        // the read-only guard let through cannot leave a write behind
        let mut tx = self.pool.begin().await.map_err(map_execute_error)?;
        let fetched = sqlx::query(sql).fetch_all(&mut *tx).await;
        let rolled_back = tx.rollback().await;

        let result = fetched.map_err(map_execute_error)?;
        rolled_back.map_err(map_execute_error)?;

        let execution_time = start.elapsed();

        let columns = match result.first() {
            Some(first_row) => row_columns(first_row),
            None => self.describe_columns(sql).await,
        };

        let rows = result.iter().map(convert_row).collect::<Result<Vec<Row>>>()?;

        Ok(QueryResult::with_data(columns, rows).with_execution_time(execution_time))
    }

    async fn execute_script(&self, sql: &str) -> Result<()> {
        sqlx::raw_sql(sql)
            .execute(&self.pool)
            .await
            .map_err(map_execute_error)?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

/// Converts a sqlx SqliteRow to our Row type.
fn convert_row(row: &SqliteRow) -> Result<Row> {
    (0..row.len()).map(|i| convert_value(row, i)).collect()
}

/// Converts a single value, dispatching on the value's storage class rather
/// than the declared column type. Expression columns have no declared type.
fn convert_value(row: &SqliteRow, index: usize) -> Result<Value> {
    let raw = row.try_get_raw(index).map_err(|e| decode_error(row, index, e))?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let storage_class = raw.type_info().name().to_uppercase();

    let value = match storage_class.as_str() {
        "INTEGER" => row.try_get::<i64, _>(index).map(Value::Int),
        "REAL" => row.try_get::<f64, _>(index).map(Value::Float),
        "BLOB" => row.try_get::<Vec<u8>, _>(index).map(Value::Bytes),
        "BOOLEAN" => row.try_get::<bool, _>(index).map(Value::Bool),
        _ => row.try_get::<String, _>(index).map(Value::String),
    };

    value.map_err(|e| decode_error(row, index, e))
}

fn decode_error(row: &SqliteRow, index: usize, error: sqlx::Error) -> Error {
    let name = row.columns().get(index).map(|c| c.name()).unwrap_or("?");
    Error::query(format!("cannot read column \"{name}\": {error}"))
}
