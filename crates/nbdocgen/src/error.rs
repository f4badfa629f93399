//! Error types for notebook annotation

use nbdocgen_notebook::NotebookError;
use thiserror::Error;

/// Error type for an annotation run
#[derive(Error, Debug)]
pub enum DocgenError {
    /// No API credential configured
    #[error("{0}")]
    Authentication(String),

    /// Loading, validating or writing a notebook failed
    #[error(transparent)]
    Notebook(#[from] NotebookError),

    /// Remote call failed, timed out, or returned nothing usable
    #[error("Generation service error: {0}")]
    GenerationService(String),
}

impl DocgenError {
    /// Short name of the error kind, used in log lines.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Authentication(_) => "AuthenticationError",
            Self::Notebook(e) if e.is_malformed() => "MalformedDocumentError",
            Self::Notebook(NotebookError::InvalidInput { .. }) => "InvalidInputError",
            Self::Notebook(NotebookError::OutputConflict(_)) => "OutputConflictError",
            Self::Notebook(_) => "IoError",
            Self::GenerationService(_) => "GenerationServiceError",
        }
    }

    /// Whether the error was raised before any network activity or write.
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::Authentication(_)
                | Self::Notebook(
                    NotebookError::InvalidInput { .. } | NotebookError::OutputConflict(_)
                )
        )
    }
}

/// Result type alias for annotation operations
pub type Result<T> = std::result::Result<T, DocgenError>;
