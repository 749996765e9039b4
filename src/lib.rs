//! Castings - SQL join exercises over a movies/actors/castings dataset.
//!
//! This library exposes the core modules for use by the binary and the
//! integration tests.

pub mod config;
pub mod db;
pub mod error;
pub mod exercises;
pub mod fixtures;
pub mod logging;
pub mod output;
pub mod query;
pub mod safety;
