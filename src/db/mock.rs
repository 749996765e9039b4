//! Mock database clients for testing.
//!
//! `MockDatabaseClient` answers from a table of canned results and records the
//! statements it saw. `FailingDatabaseClient` rejects everything.

use super::{DatabaseBackend, DatabaseClient, QueryResult};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// A mock database client that returns predefined results.
#[derive(Default)]
pub struct MockDatabaseClient {
    results: HashMap<String, QueryResult>,
    executed: Mutex<Vec<String>>,
}

impl MockDatabaseClient {
    /// Creates a new mock client that answers every statement with no rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the result returned for an exact SQL string.
    pub fn with_result(mut self, sql: impl Into<String>, result: QueryResult) -> Self {
        self.results.insert(sql.into(), result);
        self
    }

    /// Returns every statement passed to the client, in call order.
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|sqls| sqls.clone())
            .unwrap_or_default()
    }

    fn record(&self, sql: &str) {
        if let Ok(mut sqls) = self.executed.lock() {
            sqls.push(sql.to_string());
        }
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::Sqlite
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        self.record(sql);
        Ok(self.results.get(sql).cloned().unwrap_or_default())
    }

    async fn execute_script(&self, sql: &str) -> Result<()> {
        self.record(sql);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// A database client whose connection is never available.
pub struct FailingDatabaseClient {
    message: String,
}

impl FailingDatabaseClient {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Default for FailingDatabaseClient {
    fn default() -> Self {
        Self::new("connection is not available")
    }
}

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::Postgres
    }

    async fn execute_query(&self, _sql: &str) -> Result<QueryResult> {
        Err(Error::connection(self.message.clone()))
    }

    async fn execute_script(&self, _sql: &str) -> Result<()> {
        Err(Error::connection(self.message.clone()))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
