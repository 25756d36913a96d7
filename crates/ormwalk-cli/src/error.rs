//! CLI error types.

use std::path::PathBuf;

use thiserror::Error;

/// CLI errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Planning failed.
    #[error("planning error: {0}")]
    Plan(#[from] ormwalk_core::Error),

    /// An input file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// An input file is not valid JSON for its role.
    #[error("invalid {what} in {}: {source}", path.display())]
    Parse {
        /// What the file should contain.
        what: &'static str,
        /// File that failed.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// Command-line arguments are inconsistent.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for CLI operations.
pub type Result<T> = std::result::Result<T, Error>;
