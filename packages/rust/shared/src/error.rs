//! Error types for shopmirror.
//!
//! Library crates use [`ShopMirrorError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all shopmirror operations.
#[derive(Debug, thiserror::Error)]
pub enum ShopMirrorError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Browser navigation or in-page evaluation error.
    #[error("browser error: {0}")]
    Browser(String),

    /// The site payload did not have the expected shape.
    #[error("extraction error: {message}")]
    Extraction { message: String },

    /// Network/HTTP error (image fetches).
    #[error("network error: {0}")]
    Network(String),

    /// Catalog storage layer error.
    #[error("catalog error: {0}")]
    Catalog(String),

    /// A caller-supplied category id does not exist in the catalog.
    #[error("category not found: {id}")]
    CategoryNotFound { id: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ShopMirrorError>;

impl ShopMirrorError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create an extraction error from any displayable message.
    pub fn extraction(msg: impl Into<String>) -> Self {
        Self::Extraction {
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
