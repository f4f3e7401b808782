//! Resolve, read and merge both configuration files.

use crate::collector::CollectorConfig;
use crate::document::read_document;
use crate::redaction::RedactionConfig;
use crate::resolve::{resolve_config, ConfigPaths};
use crate::snapshot::ConfigSnapshot;
use crate::validate::{validate_collector, validate_redaction, ValidationError, ValidationResult};
use hc_redact::CleanerConfig;
use std::path::Path;
use tracing::{debug, info};

/// Configuration for one run, with its provenance.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub paths: ConfigPaths,
    pub collector: CollectorConfig,
    pub redaction: RedactionConfig,
    collector_raw: Option<String>,
    redaction_raw: Option<String>,
}

impl LoadedConfig {
    /// In-memory configuration with built-in provenance.
    pub fn new(collector: CollectorConfig, redaction: RedactionConfig) -> Self {
        Self {
            collector,
            redaction,
            ..Self::default()
        }
    }

    /// Resolve and read both files. A path given explicitly must exist;
    /// anything not found falls back to built-in defaults.
    pub fn load(
        cli_collector: Option<&Path>,
        cli_redaction: Option<&Path>,
    ) -> ValidationResult<Self> {
        for path in [cli_collector, cli_redaction].into_iter().flatten() {
            if !path.exists() {
                return Err(ValidationError::IoError(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
        }

        let paths = resolve_config(cli_collector, cli_redaction);
        let mut loaded = LoadedConfig {
            paths,
            ..LoadedConfig::default()
        };

        if let Some(ref path) = loaded.paths.collector {
            let (config, raw) = read_document(path)?;
            loaded.collector = config;
            loaded.collector_raw = Some(raw);
        }
        if let Some(ref path) = loaded.paths.redaction {
            let (config, raw) = read_document(path)?;
            loaded.redaction = config;
            loaded.redaction_raw = Some(raw);
        }

        info!(
            collector_source = %loaded.paths.collector_source,
            redaction_source = %loaded.paths.redaction_source,
            "configuration resolved"
        );
        debug!(
            keywords = loaded.redaction.keywords.len(),
            patterns = loaded.redaction.patterns.len(),
            removals = loaded.redaction.files.len(),
            overrides = loaded.redaction.overrides.len(),
            "redaction rules loaded"
        );
        Ok(loaded)
    }

    /// Check everything the run will compile.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_collector(&self.collector)?;
        validate_redaction(&self.redaction)
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot::new(
            &self.paths,
            self.collector_raw.as_deref(),
            self.redaction_raw.as_deref(),
            &self.collector,
            &self.redaction,
        )
    }

    /// Cleaner settings for the run. `hostname` is the resolved host name;
    /// the configured override wins when set.
    pub fn cleaner_config(&self, hostname: Option<String>) -> CleanerConfig {
        CleanerConfig {
            drop_rules: self.redaction.patterns.rules().to_vec(),
            keywords: self.redaction.keywords.clone(),
            keyword_match: self.collector.keyword_match,
            obfuscate: self.collector.obfuscate,
            hostname: self.collector.hostname.clone().or(hostname),
            max_line_length: self.collector.max_line_length,
        }
    }
}
