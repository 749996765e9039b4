//! Read-only guard for submitted SQL.
//!
//! Parses SQL and classifies it as read-only, mutating, or destructive so the
//! executor can refuse anything that would write to the dataset.

mod parser;

pub use parser::{classify_sql, SqlClassifier};

use std::fmt;

/// Safety level classification for SQL statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SafetyLevel {
    /// Read-only statements (SELECT, EXPLAIN, SHOW).
    ReadOnly,
    /// Data modification (INSERT, UPDATE, MERGE).
    Mutating,
    /// Data loss or schema changes (DELETE, DROP, TRUNCATE, ALTER, CREATE, ...).
    Destructive,
}

impl SafetyLevel {
    /// Returns true if running a statement at this level could write.
    pub fn writes(&self) -> bool {
        !matches!(self, Self::ReadOnly)
    }

    /// Higher is more dangerous.
    fn priority(&self) -> u8 {
        match self {
            Self::ReadOnly => 0,
            Self::Mutating => 1,
            Self::Destructive => 2,
        }
    }
}

impl fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadOnly => write!(f, "Read-only"),
            Self::Mutating => write!(f, "Mutating"),
            Self::Destructive => write!(f, "Destructive"),
        }
    }
}

/// The type of SQL statement detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementType {
    Select,
    Insert,
    Update,
    Delete,
    Drop,
    Truncate,
    Alter,
    Create,
    Explain,
    Show,
    Merge,
    Unknown,
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Drop => "DROP",
            Self::Truncate => "TRUNCATE",
            Self::Alter => "ALTER",
            Self::Create => "CREATE",
            Self::Explain => "EXPLAIN",
            Self::Show => "SHOW",
            Self::Merge => "MERGE",
            Self::Unknown => "UNKNOWN",
        };
        write!(f, "{name}")
    }
}

/// Result of classifying a SQL string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationResult {
    /// The most dangerous level found across all statements.
    pub level: SafetyLevel,
    /// Type of the statement that determined `level`.
    pub statement_type: StatementType,
    /// How many statements the text contains.
    pub statement_count: usize,
}

impl ClassificationResult {
    pub fn new(level: SafetyLevel, statement_type: StatementType, statement_count: usize) -> Self {
        Self {
            level,
            statement_type,
            statement_count,
        }
    }

    /// True for exactly one statement that cannot write.
    pub fn is_single_read(&self) -> bool {
        self.statement_count == 1 && !self.level.writes()
    }
}
