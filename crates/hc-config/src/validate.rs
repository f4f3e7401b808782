//! Configuration validation errors and semantic validation.
//!
//! Everything a run will compile (drop patterns, keywords, globs, the archive
//! path pattern) is checked here, before any file of the archive is touched.

use crate::collector::CollectorConfig;
use crate::redaction::RedactionConfig;
use globset::Glob;
use hc_redact::{validate_keyword, LineFilter, RedactionError};
use regex::Regex;
use thiserror::Error;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Invalid keyword: {reason}")]
    InvalidKeyword { keyword: String, reason: String },

    #[error("Invalid glob '{glob}': {message}")]
    InvalidGlob { glob: String, message: String },

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::InvalidPattern { .. } => 62,
            ValidationError::InvalidKeyword { .. } => 63,
            ValidationError::InvalidGlob { .. } => 64,
            ValidationError::InvalidValue { .. } => 65,
        }
    }
}

impl From<RedactionError> for ValidationError {
    fn from(err: RedactionError) -> Self {
        match err {
            RedactionError::PatternError { pattern, message } => {
                ValidationError::InvalidPattern { pattern, message }
            }
            RedactionError::InvalidKeyword { keyword, reason } => {
                ValidationError::InvalidKeyword { keyword, reason }
            }
            other => ValidationError::InvalidValue {
                field: "redaction".to_string(),
                message: other.to_string(),
            },
        }
    }
}

/// Validate collector settings.
pub fn validate_collector(config: &CollectorConfig) -> ValidationResult<()> {
    if config.max_line_length == 0 {
        return Err(ValidationError::InvalidValue {
            field: "max_line_length".to_string(),
            message: "Must be positive".to_string(),
        });
    }

    if let Some(ref hostname) = config.hostname {
        let trimmed = hostname.trim().trim_end_matches('.');
        if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
            return Err(ValidationError::InvalidValue {
                field: "hostname".to_string(),
                message: "Must be a single non-empty host name".to_string(),
            });
        }
    }

    if let Some(ref pattern) = config.archive_pattern {
        Regex::new(pattern).map_err(|e| ValidationError::InvalidPattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
    }

    Ok(())
}

/// Validate redaction rules.
pub fn validate_redaction(config: &RedactionConfig) -> ValidationResult<()> {
    LineFilter::compile(config.patterns.rules())?;

    for keyword in &config.keywords {
        validate_keyword(keyword)?;
    }

    for glob in &config.files {
        validate_glob(glob)?;
    }

    for o in &config.overrides {
        validate_glob(&o.path)?;
    }

    Ok(())
}

/// Validate a path glob the way the archive walker compiles it.
fn validate_glob(glob: &str) -> ValidationResult<()> {
    if glob.trim_start_matches('/').is_empty() {
        return Err(ValidationError::InvalidGlob {
            glob: glob.to_string(),
            message: "Glob is empty".to_string(),
        });
    }
    Glob::new(glob.trim_start_matches('/')).map_err(|e| ValidationError::InvalidGlob {
        glob: glob.to_string(),
        message: e.to_string(),
    })?;
    Ok(())
}
