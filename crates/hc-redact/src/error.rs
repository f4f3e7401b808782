//! Error types for the redaction engine.

use crate::Category;
use thiserror::Error;

/// Result type for redaction operations.
pub type Result<T> = std::result::Result<T, RedactionError>;

/// Errors that can occur during redaction.
#[derive(Error, Debug)]
pub enum RedactionError {
    /// A line-drop pattern failed to compile.
    #[error("invalid redaction pattern '{pattern}': {message}")]
    PatternError { pattern: String, message: String },

    /// A keyword cannot be obfuscated without re-matching its own label.
    #[error("invalid keyword '{keyword}': {reason}")]
    InvalidKeyword { keyword: String, reason: String },

    /// The private address pool for a category has no addresses left.
    ///
    /// Never recovered from: the value would otherwise be emitted in the clear
    /// or collide with an earlier mapping.
    #[error("{category} obfuscation pool exhausted")]
    PoolExhausted { category: Category },
}

impl RedactionError {
    pub(crate) fn pattern(pattern: &str, message: impl ToString) -> Self {
        RedactionError::PatternError {
            pattern: pattern.to_string(),
            message: message.to_string(),
        }
    }

    /// Whether the error must abort the whole collection run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RedactionError::PoolExhausted { .. })
    }
}
