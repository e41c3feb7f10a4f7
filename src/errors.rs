//! Error types for the gallery core
//!
//! Nothing here is fatal to the process. Every variant ends up as a
//! user-visible notice and the view falls back to browsing.

use thiserror::Error;

/// Result type alias using GalleryError
pub type GalleryResult<T> = Result<T, GalleryError>;

/// Main error type
#[derive(Debug, Error)]
pub enum GalleryError {
    /// The bulk request was not confirmed
    #[error("permission denied")]
    PermissionDenied,

    /// The index applied only part of a bulk mutation
    #[error("{action} {succeeded}/{total} items")]
    IndexOperationFailed {
        action: &'static str,
        succeeded: usize,
        total: usize,
    },

    /// Record disappeared between listing and action
    #[error("media not found: {0}")]
    NotFound(String),

    /// SQLite failure inside the media index
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON output could not be produced
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Config file could not be read or parsed
    #[error("configuration error: {0}")]
    Config(String),

    /// Background task panicked or was cancelled
    #[error("background worker failed: {0}")]
    Worker(String),
}

impl From<tokio::task::JoinError> for GalleryError {
    fn from(err: tokio::task::JoinError) -> Self {
        GalleryError::Worker(err.to_string())
    }
}

impl From<toml::de::Error> for GalleryError {
    fn from(err: toml::de::Error) -> Self {
        GalleryError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_failure_message() {
        let err = GalleryError::IndexOperationFailed {
            action: "Deleted",
            succeeded: 2,
            total: 3,
        };
        assert_eq!(err.to_string(), "Deleted 2/3 items");
    }
}
