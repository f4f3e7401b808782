//! Clean commands.
//!
//! `run_clean` drives one archive through the whole pipeline:
//!
//! 1. load and validate configuration
//! 2. sandbox check of the archive root
//! 3. create the report and facts directories
//! 4. walk and clean every file with one shared mapping store
//! 5. mapping reports, facts sidecar, redaction report
//!
//! A failure in steps 1-3 leaves the archive untouched.
//!
//! `run_clean_text` runs the same cleaner over a single stream.

use crate::exit_codes::ExitCode;
use crate::host::resolve_fqdn;
use hc_archive::{
    create_output_dir, write_mapping_reports, ArchiveError, ArchiveWalker, FactsRecord,
    RedactionReport, SandboxPolicy, WalkSummary,
};
use hc_config::{LoadedConfig, ValidationError};
use hc_redact::{
    Category, CategorySet, CleanOptions, Cleaner, LineStats, MappingStore, RedactionError,
    WidthMode,
};
use serde::Serialize;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Facts file name used when no facts path is configured.
pub const DEFAULT_FACTS_FILE: &str = "obfuscation.facts";

/// Errors that end a clean command.
#[derive(Error, Debug)]
pub enum CleanError {
    #[error("invalid arguments: {0}")]
    Args(String),

    #[error("configuration error: {0}")]
    Config(#[from] ValidationError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Redaction(#[from] RedactionError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CleanError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CleanError::Args(_) => ExitCode::ArgsError,
            CleanError::Config(_) => ExitCode::ConfigError,
            CleanError::Archive(e) => match e {
                ArchiveError::UnsafeRoot { .. } => ExitCode::UnsafeRoot,
                ArchiveError::InvalidPattern { .. } => ExitCode::ConfigError,
                ArchiveError::OutputDir { .. } | ArchiveError::Io(_) | ArchiveError::Walk(_) => {
                    ExitCode::IoError
                }
                ArchiveError::Redaction(e) => redaction_exit_code(e),
                ArchiveError::Json(_) => ExitCode::InternalError,
            },
            CleanError::Redaction(e) => redaction_exit_code(e),
            CleanError::Io(_) => ExitCode::IoError,
        }
    }
}

fn redaction_exit_code(err: &RedactionError) -> ExitCode {
    match err {
        RedactionError::PoolExhausted { .. } => ExitCode::PoolExhausted,
        RedactionError::PatternError { .. } | RedactionError::InvalidKeyword { .. } => {
            ExitCode::ConfigError
        }
    }
}

pub type Result<T> = std::result::Result<T, CleanError>;

/// Configuration inputs shared by every command.
#[derive(Debug, Clone, Default)]
pub struct ConfigRequest {
    pub collector_config: Option<PathBuf>,
    pub redaction_config: Option<PathBuf>,
    /// Added to the configured keywords.
    pub keywords: Vec<String>,
    /// Replaces the configured categories.
    pub obfuscate: Option<CategorySet>,
    /// Run-wide categories to leave alone.
    pub no_obfuscate: CategorySet,
    pub no_redact: bool,
    pub hostname: Option<String>,
}

impl ConfigRequest {
    /// Load, apply command-line overrides, validate.
    pub fn load(&self) -> Result<LoadedConfig> {
        let mut loaded = LoadedConfig::load(
            self.collector_config.as_deref(),
            self.redaction_config.as_deref(),
        )?;
        loaded.redaction.add_keywords(self.keywords.iter().cloned());
        if let Some(obfuscate) = self.obfuscate {
            loaded.collector.obfuscate = obfuscate;
        }
        if self.hostname.is_some() {
            loaded.collector.hostname = self.hostname.clone();
        }
        loaded.validate()?;
        Ok(loaded)
    }

    fn options(&self) -> CleanOptions {
        CleanOptions::default()
            .with_no_obfuscate(self.no_obfuscate)
            .with_no_redact(self.no_redact)
    }
}

/// Everything `clean <ARCHIVE>` needs.
#[derive(Debug, Clone, Default)]
pub struct CleanRequest {
    pub archive: PathBuf,
    pub config: ConfigRequest,
    pub report_dir: Option<PathBuf>,
    pub facts_path: Option<PathBuf>,
}

/// Result of a successful archive clean.
#[derive(Debug, Clone, Serialize)]
pub struct CleanOutcome {
    pub archive: PathBuf,
    pub summary: WalkSummary,
    /// Categories obfuscated for the run.
    pub obfuscate: CategorySet,
    pub mapping_reports: Vec<PathBuf>,
    pub facts_path: PathBuf,
    pub redaction_report: PathBuf,
}

impl CleanOutcome {
    /// Single-file failures are reported but do not fail the run.
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::Clean
    }
}

/// Build the cleaner for a validated configuration.
fn build_cleaner(loaded: &LoadedConfig) -> Result<Cleaner> {
    let hostname = if loaded.collector.obfuscate.contains(Category::Hostname) {
        resolve_fqdn(loaded.collector.hostname.as_deref())
    } else {
        None
    };
    Ok(Cleaner::new(
        &loaded.cleaner_config(hostname),
        Arc::new(MappingStore::new()),
    )?)
}

/// Clean an archive in place and write its reports.
pub fn run_clean(request: &CleanRequest) -> Result<CleanOutcome> {
    let loaded = request.config.load()?;

    let mut policy = SandboxPolicy::new();
    if let Some(ref pattern) = loaded.collector.archive_pattern {
        policy = policy.with_pattern(pattern)?;
    }
    let root = policy.check(&request.archive)?;

    // Output locations are settled before any file of the archive changes.
    let report_dir = request
        .report_dir
        .clone()
        .or_else(|| loaded.collector.report_dir.clone())
        .or_else(|| root.parent().map(Path::to_path_buf))
        .ok_or_else(|| CleanError::Args("cannot determine report directory".to_string()))?;
    let facts_path = request
        .facts_path
        .clone()
        .or_else(|| loaded.collector.facts_path.clone())
        .unwrap_or_else(|| report_dir.join(DEFAULT_FACTS_FILE));
    create_output_dir(&report_dir)?;
    if let Some(dir) = facts_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_output_dir(dir)?;
    }

    let cleaner = build_cleaner(&loaded)?;
    let store = cleaner.store().clone();
    let options = request.config.options();
    let enabled = cleaner.enabled(&options);

    let walker = ArchiveWalker::new(Arc::new(cleaner))
        .with_removals(&loaded.redaction.files)?
        .with_overrides(&loaded.redaction.overrides)?
        .with_options(options);
    let summary = walker.walk(&root)?;
    if summary.has_failures() {
        warn!(failed = summary.files_failed, "some files could not be cleaned");
    }

    let archive_name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "archive".to_string());
    let mapping_reports = write_mapping_reports(&store, enabled, &report_dir, &archive_name)?;

    FactsRecord::from_store(&store, enabled).write(&facts_path)?;

    let report = RedactionReport::new(&summary, &store, enabled, loaded.snapshot().to_value());
    let redaction_report = report.write(&root)?;

    info!(
        files = summary.files_seen,
        rewritten = summary.files_rewritten,
        failed = summary.files_failed,
        reports = mapping_reports.len(),
        "clean complete"
    );

    Ok(CleanOutcome {
        archive: root,
        summary,
        obfuscate: enabled,
        mapping_reports,
        facts_path,
        redaction_report,
    })
}

/// Options for `clean-text`.
#[derive(Debug, Clone, Default)]
pub struct TextRequest {
    pub config: ConfigRequest,
    /// Keep column alignment (tabular command output).
    pub preserve_width: bool,
}

/// Clean a stream with the configured cleaner. Returns the line counters.
pub fn run_clean_text<R: Read, W: Write>(
    request: &TextRequest,
    mut input: R,
    mut output: W,
) -> Result<LineStats> {
    let loaded = request.config.load()?;
    let cleaner = build_cleaner(&loaded)?;

    let mut bytes = Vec::new();
    input.read_to_end(&mut bytes)?;
    let text = String::from_utf8_lossy(&bytes);

    let mut options = request.config.options();
    if request.preserve_width {
        options.width_mode = WidthMode::Preserve;
    }
    let cleaned = cleaner.clean_text(&text, &options)?;
    cleaner.note_truncation(&cleaned.stats);
    output.write_all(cleaned.text.as_bytes())?;
    output.flush()?;
    Ok(cleaned.stats)
}
