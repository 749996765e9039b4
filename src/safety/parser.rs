//! SQL parsing and classification logic.
//!
//! Uses sqlparser-rs with the dialect of the target backend to parse SQL and
//! classify statements by whether they can write.

use sqlparser::ast::{Query, Select, SetExpr, Statement, TableFactor, TableWithJoins};
use sqlparser::dialect::{Dialect, PostgreSqlDialect, SQLiteDialect};
use sqlparser::parser::Parser;
use sqlparser::tokenizer::{Token, Tokenizer};

use crate::db::DatabaseBackend;
use crate::error::{Error, Result};

use super::{ClassificationResult, SafetyLevel, StatementType};

/// SQL classifier that parses and classifies SQL statements.
#[derive(Debug, Clone, Copy)]
pub struct SqlClassifier {
    backend: DatabaseBackend,
}

impl Default for SqlClassifier {
    fn default() -> Self {
        Self::new(DatabaseBackend::default())
    }
}

impl SqlClassifier {
    /// Creates a classifier using the SQL dialect of `backend`.
    pub fn new(backend: DatabaseBackend) -> Self {
        Self { backend }
    }

    /// Classifies a SQL string.
    ///
    /// Fails with a query error carrying the parser message when the text
    /// does not parse in this dialect.
    pub fn classify(&self, sql: &str) -> Result<ClassificationResult> {
        let statements = parse(self.dialect().as_ref(), sql)?;

        // Multiple statements: use the most dangerous classification
        let (level, statement_type) = statements
            .iter()
            .map(classify_statement)
            .reduce(max_of)
            .unwrap_or((SafetyLevel::ReadOnly, StatementType::Unknown));

        Ok(ClassificationResult::new(
            level,
            statement_type,
            statements.len(),
        ))
    }

    /// Counts `;`-separated statements using the tokenizer alone.
    ///
    /// Works on text the parser rejects, since string literals and comments
    /// are still recognized. Returns `None` when the text does not tokenize.
    pub fn count_statements(&self, sql: &str) -> Option<usize> {
        let dialect = self.dialect();
        let tokens = Tokenizer::new(dialect.as_ref(), sql).tokenize().ok()?;

        let count = tokens
            .split(|token| *token == Token::SemiColon)
            .filter(|chunk| {
                chunk
                    .iter()
                    .any(|token| !matches!(token, Token::Whitespace(_) | Token::EOF))
            })
            .count();

        Some(count)
    }

    fn dialect(&self) -> Box<dyn Dialect> {
        match self.backend {
            DatabaseBackend::Postgres => Box::new(PostgreSqlDialect {}),
            DatabaseBackend::Sqlite => Box::new(SQLiteDialect {}),
        }
    }
}

fn parse(dialect: &dyn Dialect, sql: &str) -> Result<Vec<Statement>> {
    Parser::parse_sql(dialect, sql).map_err(|e| Error::query(format!("SQL parse error: {e}")))
}

/// Convenience function to classify SQL without creating a classifier instance.
pub fn classify_sql(backend: DatabaseBackend, sql: &str) -> Result<ClassificationResult> {
    SqlClassifier::new(backend).classify(sql)
}

/// Returns whichever classification is more dangerous, preferring `a` on ties.
fn max_of(
    a: (SafetyLevel, StatementType),
    b: (SafetyLevel, StatementType),
) -> (SafetyLevel, StatementType) {
    if b.0.priority() > a.0.priority() {
        b
    } else {
        a
    }
}

/// Classifies a single parsed statement.
fn classify_statement(statement: &Statement) -> (SafetyLevel, StatementType) {
    match statement {
        // Query: may contain data-modifying CTEs, so recurse
        Statement::Query(query) => classify_query(query),
        Statement::Explain {
            analyze, statement, ..
        } => {
            if *analyze {
                // EXPLAIN ANALYZE executes the statement
                let (inner_level, _) = classify_statement(statement);
                (inner_level, StatementType::Explain)
            } else {
                (SafetyLevel::ReadOnly, StatementType::Explain)
            }
        }
        Statement::ShowVariable { .. }
        | Statement::ShowTables { .. }
        | Statement::ShowColumns { .. } => (SafetyLevel::ReadOnly, StatementType::Show),

        Statement::Insert { .. } => (SafetyLevel::Mutating, StatementType::Insert),
        Statement::Update { .. } => (SafetyLevel::Mutating, StatementType::Update),
        Statement::Merge { .. } => (SafetyLevel::Mutating, StatementType::Merge),

        Statement::Delete { .. } => (SafetyLevel::Destructive, StatementType::Delete),
        Statement::Drop { .. } => (SafetyLevel::Destructive, StatementType::Drop),
        Statement::Truncate { .. } => (SafetyLevel::Destructive, StatementType::Truncate),
        Statement::AlterTable { .. } => (SafetyLevel::Destructive, StatementType::Alter),
        Statement::CreateTable { .. }
        | Statement::CreateIndex { .. }
        | Statement::CreateView { .. } => (SafetyLevel::Destructive, StatementType::Create),

        // Anything else (PRAGMA, SET, GRANT, transactions...) is not a plain read
        _ => (SafetyLevel::Destructive, StatementType::Unknown),
    }
}

/// Classifies a Query by recursively inspecting for data-modifying operations.
fn classify_query(query: &Query) -> (SafetyLevel, StatementType) {
    let mut result = (SafetyLevel::ReadOnly, StatementType::Select);

    if let Some(with) = &query.with {
        for cte in &with.cte_tables {
            result = max_of(result, classify_query(&cte.query));
        }
    }

    max_of(result, classify_set_expr(&query.body))
}

/// Classifies a SetExpr, detecting mutations and recursing into nested queries.
fn classify_set_expr(set_expr: &SetExpr) -> (SafetyLevel, StatementType) {
    match set_expr {
        SetExpr::Select(select) => classify_select(select),
        SetExpr::Query(query) => classify_query(query),
        SetExpr::SetOperation { left, right, .. } => {
            max_of(classify_set_expr(left), classify_set_expr(right))
        }
        SetExpr::Values(_) | SetExpr::Table(_) => (SafetyLevel::ReadOnly, StatementType::Select),

        // Data-modifying CTE bodies
        SetExpr::Insert(stmt) | SetExpr::Update(stmt) => classify_statement(stmt),

        #[allow(unreachable_patterns)]
        _ => (SafetyLevel::Destructive, StatementType::Unknown),
    }
}

/// Classifies a Select by checking its FROM clause for subqueries.
fn classify_select(select: &Select) -> (SafetyLevel, StatementType) {
    select
        .from
        .iter()
        .map(classify_table_with_joins)
        .fold((SafetyLevel::ReadOnly, StatementType::Select), max_of)
}

/// Classifies a TableWithJoins, checking the main relation and all joins.
fn classify_table_with_joins(twj: &TableWithJoins) -> (SafetyLevel, StatementType) {
    twj.joins
        .iter()
        .map(|join| classify_table_factor(&join.relation))
        .fold(classify_table_factor(&twj.relation), max_of)
}

/// Classifies a TableFactor, recursing into derived tables (subqueries).
fn classify_table_factor(factor: &TableFactor) -> (SafetyLevel, StatementType) {
    match factor {
        TableFactor::Derived { subquery, .. } => classify_query(subquery),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => classify_table_with_joins(table_with_joins),
        _ => (SafetyLevel::ReadOnly, StatementType::Select),
    }
}
