//! Error types for miniplan store operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during `JsonStore` operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Key cannot be mapped to a file name.
    #[error("Invalid bucket key: {0:?}")]
    InvalidKey(String),

    /// Stored snapshot is not valid JSON.
    #[error("Failed to parse {path}: {source}")]
    Parse {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying parser error.
        #[source]
        source: serde_json::Error,
    },

    /// Failed to serialize a snapshot to JSON.
    #[error("Failed to serialize snapshot: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Temporary file could not be moved into place.
    #[error("Failed to replace {path}: {source}")]
    Persist {
        /// Destination file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
