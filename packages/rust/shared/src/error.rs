//! Error types for Darkmatter.
//!
//! Library crates use [`DarkmatterError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Darkmatter operations.
#[derive(Debug, thiserror::Error)]
pub enum DarkmatterError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (unknown stage name, missing content, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Frontmatter could not be extracted from the raw markdown.
    #[error("frontmatter error: {message}")]
    Frontmatter { message: String },

    /// A builder stage finished with a failure outcome.
    #[error("{0}")]
    Builder(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DarkmatterError>;

impl DarkmatterError {
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

    /// Create a frontmatter error from any displayable message.
    pub fn frontmatter(msg: impl Into<String>) -> Self {
        Self::Frontmatter {
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
