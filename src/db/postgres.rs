//! PostgreSQL database client implementation.
//!
//! Provides the `PostgresClient` struct that implements the `DatabaseClient` trait
//! for PostgreSQL databases using sqlx.

use super::{map_execute_error, row_columns, statement_columns};
use crate::config::ConnectionConfig;
use crate::db::{DatabaseBackend, DatabaseClient, QueryResult, Row, Value};
use crate::error::{Error, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgColumn, PgPool, PgPoolOptions, PgRow, Postgres};
use sqlx::types::chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::types::{Decimal, JsonValue, Uuid};
use sqlx::{Column as SqlxColumn, Executor, Row as SqlxRow, Statement, TypeInfo};
use std::time::{Duration, Instant};
use tracing::debug;

/// How long to wait for the connection before giving up.
const ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// PostgreSQL database client.
///
/// Holds exactly one connection; statements run one at a time.
#[derive(Debug)]
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Connects to the database described by `config`.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let conn_str = config.to_connection_string()?;
        debug!("Connecting to {}", config.display_string());

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECS))
            .connect(&conn_str)
            .await
            .map_err(|e| map_connection_error(e, config))?;

        debug!("Successfully connected to database");
        Ok(Self { pool })
    }

    /// Creates a new PostgresClient from an existing connection pool.
    ///
    /// This is primarily useful for testing.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Column metadata for a statement that produced no rows.
    async fn describe_columns(&self, sql: &str) -> Vec<super::ColumnInfo> {
        match (&self.pool).prepare(sql).await {
            Ok(statement) => statement_columns(statement.columns()),
            Err(_) => Vec::new(),
        }
    }
}

#[async_trait]
impl DatabaseClient for PostgresClient {
    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::Postgres
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        let start = Instant::now();

        // Queries run in a read-only transaction that is never committed
        let mut tx = self.pool.begin().await.map_err(map_execute_error)?;
        sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(map_execute_error)?;
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

/// Converts a sqlx PgRow to our Row type.
fn convert_row(row: &PgRow) -> Result<Row> {
    row.columns()
        .iter()
        .map(|column| convert_value(row, column))
        .collect()
}

/// Decodes a nullable column.
///
/// A value that cannot be decoded is an error naming the column, never NULL.
fn decode<T>(row: &PgRow, column: &PgColumn) -> Result<Option<T>>
where
    T: for<'r> sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get::<Option<T>, _>(column.ordinal()).map_err(|e| {
        Error::query(format!(
            "cannot read column \"{}\" of type {}: {e}",
            column.name(),
            column.type_info().name()
        ))
    })
}

/// Converts a single column value by its PostgreSQL type name.
///
/// NUMERIC keeps its exact decimal text; dates, times, UUIDs and JSON are
/// rendered as text the way psql prints them.
fn convert_value(row: &PgRow, column: &PgColumn) -> Result<Value> {
    let value = match column.type_info().name() {
        "BOOL" => decode::<bool>(row, column)?.map(Value::Bool),
        "INT2" => decode::<i16>(row, column)?.map(|v| Value::Int(v.into())),
        "INT4" => decode::<i32>(row, column)?.map(|v| Value::Int(v.into())),
        "INT8" => decode::<i64>(row, column)?.map(Value::Int),
        "FLOAT4" => decode::<f32>(row, column)?.map(|v| Value::Float(v.into())),
        "FLOAT8" => decode::<f64>(row, column)?.map(Value::Float),
        "BYTEA" => decode::<Vec<u8>>(row, column)?.map(Value::Bytes),
        "NUMERIC" => decode::<Decimal>(row, column)?.map(|v| Value::String(v.to_string())),
        "DATE" => decode::<NaiveDate>(row, column)?.map(|v| Value::String(v.to_string())),
        "TIME" => decode::<NaiveTime>(row, column)?.map(|v| Value::String(v.to_string())),
        "TIMESTAMP" => decode::<NaiveDateTime>(row, column)?.map(|v| Value::String(v.to_string())),
        "TIMESTAMPTZ" => decode::<DateTime<Utc>>(row, column)?.map(|v| Value::String(v.to_rfc3339())),
        "UUID" => decode::<Uuid>(row, column)?.map(|v| Value::String(v.to_string())),
        "JSON" | "JSONB" => decode::<JsonValue>(row, column)?.map(|v| Value::String(v.to_string())),
        // TEXT, VARCHAR, BPCHAR, NAME; anything else fails loudly
        _ => decode::<String>(row, column)?.map(Value::String),
    };

    Ok(value.unwrap_or(Value::Null))
}

/// Maps a failed connect into a connection error naming the target.
///
/// The driver's own message is kept in parentheses.
fn map_connection_error(error: sqlx::Error, config: &ConnectionConfig) -> Error {
    let code = error
        .as_database_error()
        .and_then(|e| e.code())
        .map(|c| c.into_owned());

    let reason = match (&error, code.as_deref()) {
        (_, Some("28P01" | "28000")) => "authentication failed",
        (_, Some("3D000")) => "database does not exist",
        (sqlx::Error::Io(_), _) => "server is not reachable",
        (sqlx::Error::Tls(_), _) => "TLS negotiation failed",
        (sqlx::Error::PoolTimedOut, _) => "timed out waiting for the server",
        _ => "connection failed",
    };

    Error::connection(format!(
        "Cannot connect to {}: {reason} ({error})",
        config.display_string()
    ))
}
