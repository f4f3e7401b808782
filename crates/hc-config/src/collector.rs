//! Collector settings (`collector.yaml` / `collector.json`).

use crate::document::{parse_document, read_document, DocumentFormat};
use crate::validate::ValidationResult;
use hc_redact::{CategorySet, CleanerConfig, KeywordMatch, DEFAULT_MAX_LINE_LENGTH};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Run-wide collector settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CollectorConfig {
    /// Categories to obfuscate (`ipv4`, `ipv6`, `mac`, `hostname`, `keyword`).
    pub obfuscate: CategorySet,

    /// Host name to use instead of the resolved one.
    pub hostname: Option<String>,

    /// Lines longer than this many bytes are truncated.
    pub max_line_length: usize,

    pub keyword_match: KeywordMatch,

    /// Extra regex the canonical archive path must match.
    pub archive_pattern: Option<String>,

    /// Where mapping reports are written. Defaults to the archive's parent.
    pub report_dir: Option<PathBuf>,

    /// Facts sidecar path. Defaults to `<report_dir>/obfuscation.facts`.
    pub facts_path: Option<PathBuf>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            obfuscate: CleanerConfig::default().obfuscate,
            hostname: None,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            keyword_match: KeywordMatch::default(),
            archive_pattern: None,
            report_dir: None,
            facts_path: None,
        }
    }
}

impl CollectorConfig {
    /// Load from a JSON or YAML file.
    pub fn from_file(path: &Path) -> ValidationResult<Self> {
        Ok(read_document(path)?.0)
    }

    /// Parse from a YAML (or JSON) string.
    pub fn from_yaml(content: &str) -> ValidationResult<Self> {
        parse_document(content, DocumentFormat::Yaml)
    }
}
