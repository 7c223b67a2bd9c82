//! Error types for PartVault core operations.

use std::path::PathBuf;
use thiserror::Error;

use crate::cache::MarkerKind;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in PartVault core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A catalog request could not be completed.
    ///
    /// `status` is `Some` when the server answered with a non-success HTTP
    /// status, and `None` when the failure happened at the transport level.
    #[error("Catalog request failed{}: {reason}", .status.map(|s| format!(" (status {s})")).unwrap_or_default())]
    RequestFailed {
        /// HTTP status code, if a response was received.
        status: Option<u16>,
        /// Status text or transport error description.
        reason: String,
    },

    /// The catalog answered with an errors list instead of data.
    #[error("Catalog reported errors: {}", .messages.join("; "))]
    Remote {
        /// Error messages as reported by the catalog.
        messages: Vec<String>,
    },

    /// No response payload was available where one was expected.
    #[error("No response data from the catalog")]
    NoResponse,

    /// A marker file exists but cannot be parsed.
    #[error("Corrupt {kind} marker at {}: {reason}", .path.display())]
    CorruptMarker {
        /// Kind of the marker that failed to parse.
        kind: MarkerKind,
        /// Directory holding the marker.
        path: PathBuf,
        /// Parse error description.
        reason: String,
    },

    /// An expected marker file is absent.
    #[error("No {kind} marker found in {}", .path.display())]
    MarkerNotFound {
        /// Kind of the missing marker.
        kind: MarkerKind,
        /// Directory that was expected to hold the marker.
        path: PathBuf,
    },

    /// A subset of a download batch failed.
    #[error("{failed} of {total} file downloads failed")]
    PartialDownload {
        /// Number of items that failed.
        failed: usize,
        /// Total number of items in the batch.
        total: usize,
    },

    /// A leaf file has an extension the host application cannot open.
    #[error("Unsupported file type: {}", .path.display())]
    UnsupportedFile {
        /// Path of the rejected file.
        path: PathBuf,
    },

    /// File system operation failed.
    #[error("File system error at {}: {message}", .path.display())]
    FileSystem {
        /// Path where the error occurred.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Build a `FileSystem` error from a path and an underlying cause.
    pub fn file_system(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::FileSystem {
            path: path.into(),
            message: message.into(),
        }
    }
}
