//! Read-only query execution.
//!
//! The executor borrows a client rather than reaching for shared state, runs
//! one statement at a time, and returns either every row or an error.

use crate::db::{DatabaseClient, QueryResult, Record};
use crate::error::{Error, Result};
use crate::safety::SqlClassifier;

/// Runs read-only statements against an injected database client.
pub struct QueryExecutor<'a> {
    db: &'a dyn DatabaseClient,
    classifier: SqlClassifier,
}

impl<'a> QueryExecutor<'a> {
    /// Creates a new query executor over `db`, parsing in its dialect.
    pub fn new(db: &'a dyn DatabaseClient) -> Self {
        Self {
            db,
            classifier: SqlClassifier::new(db.backend()),
        }
    }

    /// Executes one statement and returns the fully materialized result.
    ///
    /// Zero matching rows is an empty result, not an error. Engine failures
    /// come back unchanged: `Error::Query` with the engine's message, or
    /// `Error::Connection` when the connection is gone.
    pub async fn execute(&self, sql: &str) -> Result<QueryResult> {
        self.check_read_only(sql)?;
        self.db.execute_query(sql).await
    }

    /// Executes one statement and returns its rows as column-name mappings.
    pub async fn execute_records(&self, sql: &str) -> Result<Vec<Record>> {
        Ok(self.execute(sql).await?.records())
    }

    /// Refuses statements that would write, and anything but a single statement.
    ///
    /// Text the parser cannot read is passed through so the engine reports
    /// its own error, unless the tokenizer still finds several statements.
    /// The clients run it in a transaction that cannot keep any write.
    fn check_read_only(&self, sql: &str) -> Result<()> {
        let Ok(classification) = self.classifier.classify(sql) else {
            // Still refuse a second statement hiding behind the parse error
            return match self.classifier.count_statements(sql) {
                Some(n) if n > 1 => Err(multiple_statements(n)),
                _ => Ok(()),
            };
        };

        match classification.statement_count {
            0 => return Err(Error::query("empty SQL statement")),
            1 => {}
            n => return Err(multiple_statements(n)),
        }

        if classification.level.writes() {
            return Err(Error::query(format!(
                "refusing to run {} statement: only read-only queries are allowed",
                classification.statement_type
            )));
        }

        Ok(())
    }
}

fn multiple_statements(n: usize) -> Error {
    Error::query(format!("expected a single statement, found {n}"))
}

/// Executes `sql` against `db`. Shorthand for `QueryExecutor::new(db).execute(sql)`.
pub async fn execute(db: &dyn DatabaseClient, sql: &str) -> Result<QueryResult> {
    QueryExecutor::new(db).execute(sql).await
}
