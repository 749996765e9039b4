//! Logging configuration for castings.
//!
//! Logs go to stderr so stdout carries only query results.

use tracing_subscriber::EnvFilter;

/// Returns the default filter directive for a `-v` count.
pub fn default_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Initializes logging to stderr.
///
/// `RUST_LOG` wins over the verbosity flag when set.
pub fn init_stderr_logging(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbosity)));

    // A subscriber may already be installed (tests, embedding); keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
