//! Error types for castings.
//!
//! Defines the main error enum used throughout the crate.

use thiserror::Error;

/// Main error type for castings operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database connection errors (no connection, host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Statement rejected by the engine (syntax errors, unknown identifiers, bad casts, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// Configuration errors (invalid config file, bad connection string, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Schema creation or seed script failures.
    #[error("Fixture error: {0}")]
    Fixture(String),

    /// Internal errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a fixture error with the given message.
    pub fn fixture(msg: impl Into<String>) -> Self {
        Self::Fixture(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::Config(_) => "Configuration Error",
            Self::Fixture(_) => "Fixture Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns true for errors raised by the engine while running a statement.
    pub fn is_query(&self) -> bool {
        matches!(self, Self::Query(_))
    }

    /// Returns true for errors about a missing or unreachable connection.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

/// Result type alias using the crate error.
pub type Result<T> = std::result::Result<T, Error>;
