//! Schema setup and seed data.
//!
//! The exercises assume a populated `movies`/`actors`/`castings` dataset.
//! This module creates the tables and loads data into them; nothing else in
//! the crate writes.

use std::path::Path;

use tracing::{debug, info};

use crate::db::DatabaseClient;
use crate::error::{Error, Result};

/// DDL for the three tables. Runs unchanged on SQLite and PostgreSQL.
pub const SCHEMA: &str = include_str!("schema.sql");

/// A small dataset with an answer for every exercise.
pub const SAMPLE_DATA: &str = include_str!("sample.sql");

/// Tables the dataset consists of.
pub const TABLES: [&str; 3] = ["movies", "actors", "castings"];

/// Creates the tables if they do not exist yet.
pub async fn create_schema(db: &dyn DatabaseClient) -> Result<()> {
    db.execute_script(SCHEMA)
        .await
        .map_err(|e| Error::fixture(format!("Failed to create schema: {}", inner_message(e))))?;
    debug!("Schema ready");
    Ok(())
}

/// Runs a seed script of one or more statements.
pub async fn load_script(db: &dyn DatabaseClient, sql: &str) -> Result<()> {
    db.execute_script(sql)
        .await
        .map_err(|e| Error::fixture(format!("Failed to load seed data: {}", inner_message(e))))
}

/// Reads a seed script from disk and runs it.
pub async fn load_file(db: &dyn DatabaseClient, path: &Path) -> Result<()> {
    let sql = std::fs::read_to_string(path).map_err(|e| {
        Error::fixture(format!("Failed to read seed file {}: {e}", path.display()))
    })?;
    load_script(db, &sql).await?;
    info!("Loaded seed file {}", path.display());
    Ok(())
}

/// Creates the schema and loads [`SAMPLE_DATA`].
pub async fn load_sample(db: &dyn DatabaseClient) -> Result<()> {
    create_schema(db).await?;
    load_script(db, SAMPLE_DATA).await?;
    info!("Loaded sample dataset");
    Ok(())
}

/// Row count of each dataset table, in [`TABLES`] order.
pub async fn table_counts(db: &dyn DatabaseClient) -> Result<Vec<(&'static str, i64)>> {
    let mut counts = Vec::with_capacity(TABLES.len());
    for table in TABLES {
        let result = db
            .execute_query(&format!("SELECT COUNT(*) AS n FROM {table}"))
            .await?;
        let n = result
            .rows
            .first()
            .and_then(|row| row.first())
            .and_then(|value| value.as_i64())
            .ok_or_else(|| Error::internal(format!("COUNT(*) on {table} returned no integer")))?;
        counts.push((table, n));
    }
    Ok(counts)
}

/// Strips the "Query error: " prefix so fixture errors read cleanly.
fn inner_message(error: Error) -> String {
    match error {
        Error::Query(msg) | Error::Connection(msg) => msg,
        other => other.to_string(),
    }
}
