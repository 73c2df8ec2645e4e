//! Diagnostic logging for the CLI.
//!
//! Logs go to stderr so reports on stdout stay machine-readable.

use tracing_subscriber::EnvFilter;

/// Filter used for a `-v` count; `None` defers to `RUST_LOG`.
#[must_use]
pub fn verbosity_filter(verbosity: u8) -> Option<&'static str> {
    match verbosity {
        0 => None,
        1 => Some("lexsat=info,lexsat_engine=info,lexsat_language=info,lexsat_runtime=info"),
        2 => Some("lexsat=debug,lexsat_engine=debug,lexsat_language=debug,lexsat_runtime=debug"),
        _ => Some("trace"),
    }
}

/// Installs the global fmt subscriber.
///
/// Without `-v` the filter comes from `RUST_LOG`, defaulting to warnings.
/// Returns false if a subscriber was already installed.
pub fn init(verbosity: u8) -> bool {
    let filter = match verbosity_filter(verbosity) {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}
