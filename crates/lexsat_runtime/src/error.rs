//! Errors surfaced by the runtime layer.

use std::path::PathBuf;

use lexsat_engine::ConfigError;
use thiserror::Error;

/// Result alias for runtime operations.
pub type RuntimeResult<T> = std::result::Result<T, RuntimeError>;

/// Anything that can stop a CLI run.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// An input file could not be read.
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        /// The file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// An input document is not valid JSON for its schema.
    #[error("invalid document '{}': {source}", path.display())]
    Json {
        /// The file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// A report could not be serialized.
    #[error("failed to render report: {0}")]
    Render(#[from] serde_json::Error),

    /// The solve configuration is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Compilation or solving failed.
    #[error(transparent)]
    Core(#[from] lexsat_foundation::Error),

    /// Bad command line.
    #[error("{0}")]
    Usage(String),
}
