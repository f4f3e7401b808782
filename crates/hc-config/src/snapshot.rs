//! Configuration snapshots for the redaction report.
//!
//! A snapshot records where each configuration file came from and its
//! SHA-256 digest, plus counts of what it configures. Keyword and pattern
//! values are never included: the snapshot ends up inside the archive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::collector::CollectorConfig;
use crate::redaction::RedactionConfig;
use crate::resolve::ConfigPaths;
use hc_redact::{CategorySet, KeywordMatch};

/// Provenance of one configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSnapshot {
    /// Path the file was loaded from.
    #[serde(default)]
    pub path: Option<String>,

    /// Source of the file (CLI argument, environment variable, ...).
    pub source: String,

    /// SHA-256 hash of the file content.
    #[serde(default)]
    pub sha256: Option<String>,
}

/// Key configuration values, without any sensitive content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSummary {
    pub obfuscate: CategorySet,
    pub keyword_match: KeywordMatch,
    pub max_line_length: usize,
    pub hostname_override: bool,
    pub archive_pattern: bool,
    pub pattern_count: usize,
    pub keyword_count: usize,
    pub removal_count: usize,
    pub override_count: usize,
}

/// A frozen snapshot of configuration state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Schema version of the configuration.
    pub schema_version: String,

    pub collector: FileSnapshot,
    pub redaction: FileSnapshot,

    /// Combined hash of all config files (for quick comparison).
    pub combined_hash: String,

    pub summary: ConfigSummary,
}

impl ConfigSnapshot {
    /// Create a new snapshot from loaded configuration and raw file content.
    pub fn new(
        paths: &ConfigPaths,
        collector_raw: Option<&str>,
        redaction_raw: Option<&str>,
        collector: &CollectorConfig,
        redaction: &RedactionConfig,
    ) -> Self {
        let collector_hash = collector_raw.map(hash_content);
        let redaction_hash = redaction_raw.map(hash_content);

        let combined = format!(
            "{}:{}",
            collector_hash.as_deref().unwrap_or("none"),
            redaction_hash.as_deref().unwrap_or("none")
        );

        ConfigSnapshot {
            timestamp: Utc::now(),
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            collector: FileSnapshot {
                path: paths.collector.as_ref().map(|p| p.display().to_string()),
                source: paths.collector_source.to_string(),
                sha256: collector_hash,
            },
            redaction: FileSnapshot {
                path: paths.redaction.as_ref().map(|p| p.display().to_string()),
                source: paths.redaction_source.to_string(),
                sha256: redaction_hash,
            },
            combined_hash: hash_content(&combined),
            summary: ConfigSummary::new(collector, redaction),
        }
    }

    /// Create a snapshot with only defaults (no config files loaded).
    pub fn defaults_only() -> Self {
        Self::new(
            &ConfigPaths::default(),
            None,
            None,
            &CollectorConfig::default(),
            &RedactionConfig::default(),
        )
    }

    /// Serialize snapshot to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Snapshot as a JSON value, for embedding in reports.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Check if this snapshot matches another (same config files).
    pub fn matches(&self, other: &ConfigSnapshot) -> bool {
        self.combined_hash == other.combined_hash
    }

    /// Get a short identifier for this snapshot (first 12 chars of hash).
    pub fn short_id(&self) -> &str {
        &self.combined_hash[..12.min(self.combined_hash.len())]
    }
}

impl ConfigSummary {
    fn new(collector: &CollectorConfig, redaction: &RedactionConfig) -> Self {
        ConfigSummary {
            obfuscate: collector.obfuscate,
            keyword_match: collector.keyword_match,
            max_line_length: collector.max_line_length,
            hostname_override: collector.hostname.is_some(),
            archive_pattern: collector.archive_pattern.is_some(),
            pattern_count: redaction.patterns.len(),
            keyword_count: redaction.keywords.len(),
            removal_count: redaction.files.len(),
            override_count: redaction.overrides.len(),
        }
    }
}

/// Hash content with SHA-256 and return hex string.
fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
