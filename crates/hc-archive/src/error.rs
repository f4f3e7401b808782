//! Error types for archive operations.

use hc_redact::RedactionError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while cleaning an archive.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Cleaning failed
    #[error(transparent)]
    Redaction(#[from] RedactionError),

    /// Traversal error
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// The archive root is outside the collection sandbox.
    #[error("refusing to clean '{}': {reason}", path.display())]
    UnsafeRoot { path: PathBuf, reason: String },

    /// A report or facts directory could not be created.
    #[error("cannot create output directory '{}': {source}", path.display())]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A removal or override glob, or the archive pattern, is invalid.
    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

impl ArchiveError {
    pub(crate) fn unsafe_root(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ArchiveError::UnsafeRoot {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn pattern(pattern: &str, message: impl ToString) -> Self {
        ArchiveError::InvalidPattern {
            pattern: pattern.to_string(),
            message: message.to_string(),
        }
    }

    /// Whether the error must abort the run rather than skip one file.
    pub fn is_fatal(&self) -> bool {
        match self {
            ArchiveError::Redaction(e) => e.is_fatal(),
            ArchiveError::Io(_) | ArchiveError::Walk(_) => false,
            _ => true,
        }
    }
}

/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;
