//! Error types for the licensee enrichment tools.
//!
//! Library crates use [`LicenseeError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all enrichment operations.
#[derive(Debug, thiserror::Error)]
pub enum LicenseeError {
    /// Configuration loading or credential resolution error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Input rejected before it reaches the pipeline.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Language model completion or embedding call failed.
    #[error("model error: {0}")]
    Model(String),

    /// Record store lookup, insert, or update failed.
    ///
    /// Displays the backend's message as-is.
    #[error("{0}")]
    Store(String),

    /// CSV input could not be read.
    #[error("csv error: {0}")]
    Csv(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LicenseeError>;

impl LicenseeError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
