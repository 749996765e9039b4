//! Database abstraction layer for castings.
//!
//! Provides a trait-based interface for database operations, allowing
//! different database backends to be used interchangeably. A client is the
//! explicit stand-in for the ambient connection every exercise runs against.

mod mock;
mod postgres;
mod sqlite;
mod types;

pub use mock::{FailingDatabaseClient, MockDatabaseClient};
pub use postgres::PostgresClient;
pub use sqlite::SqliteClient;
pub use types::{ColumnInfo, QueryResult, Record, Row, Value};

use crate::config::ConnectionConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use sqlx::{Column as SqlxColumn, Row as SqlxRow, TypeInfo};

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    #[default]
    Postgres,
    Sqlite,
}

impl DatabaseBackend {
    /// Returns the backend as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }

    /// Parses a backend from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Some(Self::Postgres),
            "sqlite" | "sqlite3" => Some(Self::Sqlite),
            _ => None,
        }
    }

    /// Returns the default port for this backend, if it listens on one.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Self::Postgres => Some(5432),
            Self::Sqlite => None,
        }
    }

    /// Returns the URL scheme for this backend.
    pub fn url_scheme(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }
}

/// Creates a database client for the given backend and configuration.
///
/// This is the central factory function for database connections.
pub async fn connect(config: &ConnectionConfig) -> Result<Box<dyn DatabaseClient>> {
    match config.backend {
        DatabaseBackend::Postgres => {
            let client = PostgresClient::connect(config).await?;
            Ok(Box::new(client))
        }
        DatabaseBackend::Sqlite => {
            let client = SqliteClient::connect(config).await?;
            Ok(Box::new(client))
        }
    }
}

/// Trait defining the interface for database clients.
///
/// All database operations are async and return Results with the crate error.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// The backend this client talks to.
    fn backend(&self) -> DatabaseBackend;

    /// Executes a single SQL statement and returns the fully materialized rows.
    ///
    /// Either every row is returned or an error is; never a partial set.
    async fn execute_query(&self, sql: &str) -> Result<QueryResult>;

    /// Executes a script of one or more statements, discarding any rows.
    ///
    /// Used for schema setup and seed data, never by the exercises.
    async fn execute_script(&self, sql: &str) -> Result<()>;

    /// Closes the database connection.
    async fn close(&self) -> Result<()>;
}

/// Column metadata for a fetched row.
fn row_columns<R: SqlxRow>(row: &R) -> Vec<ColumnInfo> {
    row.columns()
        .iter()
        .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
        .collect()
}

/// Column metadata from a prepared statement, used when no rows came back.
fn statement_columns<C: SqlxColumn>(columns: &[C]) -> Vec<ColumnInfo> {
    columns
        .iter()
        .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
        .collect()
}

/// Maps a sqlx error raised while running a statement.
///
/// Transport failures become connection errors; anything the engine said
/// about the statement becomes a query error carrying the engine's message.
fn map_execute_error(error: sqlx::Error) -> Error {
    match error {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => Error::connection(error.to_string()),
        other => Error::query(format_query_error(&other)),
    }
}

/// Formats a query error, keeping the engine message and any hints.
fn format_query_error(error: &sqlx::Error) -> String {
    let Some(db_error) = error.as_database_error() else {
        return error.to_string();
    };

    let mut result = db_error.message().to_string();

    // PostgreSQL errors often carry DETAIL and HINT fields alongside the message
    if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
        if let Some(detail) = pg_error.detail() {
            result.push_str("\n  DETAIL: ");
            result.push_str(detail);
        }

        if let Some(hint) = pg_error.hint() {
            result.push_str("\n  HINT: ");
            result.push_str(hint);
        }
    }

    result
}
