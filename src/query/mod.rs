//! Query execution for castings.
//!
//! The one piece every exercise shares: hand a statement to the connection
//! and get the whole result set back.

pub mod executor;

pub use executor::{execute, QueryExecutor};
