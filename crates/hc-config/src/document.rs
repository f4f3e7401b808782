//! JSON / YAML document loading.

use crate::validate::{ValidationError, ValidationResult};
use serde::de::DeserializeOwned;
use std::path::Path;

/// On-disk format, picked by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// `.json` is JSON; anything else is read as YAML.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DocumentFormat::Json,
            _ => DocumentFormat::Yaml,
        }
    }
}

/// Parse `content` in the given format. An empty YAML document is the default.
pub fn parse_document<T: DeserializeOwned + Default>(
    content: &str,
    format: DocumentFormat,
) -> ValidationResult<T> {
    match format {
        DocumentFormat::Json => serde_json::from_str(content)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e))),
        DocumentFormat::Yaml if content.trim().is_empty() => Ok(T::default()),
        DocumentFormat::Yaml => serde_yaml::from_str(content)
            .map_err(|e| ValidationError::ParseError(format!("Invalid YAML: {}", e))),
    }
}

/// Read and parse a file, returning the raw content alongside.
pub fn read_document<T: DeserializeOwned + Default>(path: &Path) -> ValidationResult<(T, String)> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let value = parse_document(&content, DocumentFormat::for_path(path))
        .map_err(|e| match e {
            ValidationError::ParseError(msg) => {
                ValidationError::ParseError(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;
    Ok((value, content))
}
