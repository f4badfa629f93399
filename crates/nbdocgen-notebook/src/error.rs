//! Error types for notebook loading and writing

use std::path::PathBuf;
use thiserror::Error;

/// Error type for notebook operations
#[derive(Error, Debug)]
pub enum NotebookError {
    /// Input notebook is missing or cannot be read
    #[error("{}: {source}", path.display())]
    InvalidInput {
        /// Path that was requested
        path: PathBuf,
        /// Underlying I/O failure
        source: std::io::Error,
    },

    /// Input is not valid JSON
    #[error("Failed to parse notebook JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Valid JSON, but not a notebook (no `cells` array)
    #[error("Malformed notebook: {0}")]
    MalformedDocument(String),

    /// Output path is empty, equals the input, or already exists
    #[error("{0}")]
    OutputConflict(String),

    /// I/O error while writing the output notebook
    #[error("Failed to write notebook file: {0}")]
    Io(#[from] std::io::Error),
}

impl NotebookError {
    /// Whether this error means the document itself is unusable
    /// (bad JSON or missing `cells`).
    #[inline]
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(self, Self::Json(_) | Self::MalformedDocument(_))
    }
}

/// Result type alias for notebook operations
pub type Result<T> = std::result::Result<T, NotebookError>;
