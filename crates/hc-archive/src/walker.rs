//! Archive walker.
//!
//! Visits every regular file under the archive root in sorted depth-first
//! order and replaces it with its cleaned content. The order is fixed so that
//! mapping images are allocated identically on every run over the same tree.

use crate::{ArchiveError, Result};
use globset::{Glob, GlobMatcher, GlobSet, GlobSetBuilder};
use hc_redact::{CategorySet, CleanOptions, Cleaner, LineStats};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Top-level directory holding collection provenance. Never cleaned.
pub const METADATA_DIR: &str = "meta_data";

/// Per-path relaxation of the run-wide options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathOverride {
    /// Glob matched against the path relative to the archive root.
    pub path: String,
    #[serde(default)]
    pub no_obfuscate: CategorySet,
    #[serde(default)]
    pub no_redact: bool,
}

/// What happened to one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Rewritten,
    Unchanged,
    /// Every line was dropped.
    RemovedEmpty,
    /// Matched a removal glob.
    RemovedByRule,
}

/// Totals for one walk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkSummary {
    pub files_seen: u64,
    pub files_rewritten: u64,
    pub files_unchanged: u64,
    pub files_removed_empty: u64,
    pub files_removed_by_rule: u64,
    pub files_failed: u64,
    /// Relative paths of files that could not be cleaned.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_paths: Vec<String>,
    pub lines: LineStats,
}

impl WalkSummary {
    fn record(&mut self, outcome: FileOutcome, stats: LineStats) {
        match outcome {
            FileOutcome::Rewritten => self.files_rewritten += 1,
            FileOutcome::Unchanged => self.files_unchanged += 1,
            FileOutcome::RemovedEmpty => self.files_removed_empty += 1,
            FileOutcome::RemovedByRule => self.files_removed_by_rule += 1,
        }
        self.lines += stats;
    }

    fn record_failure(&mut self, rel: String) {
        self.files_failed += 1;
        self.failed_paths.push(rel);
    }

    /// Whether any file was skipped because of an error.
    pub fn has_failures(&self) -> bool {
        self.files_failed > 0
    }
}

/// Applies a [`Cleaner`] to every file of an archive.
#[derive(Debug)]
pub struct ArchiveWalker {
    cleaner: Arc<Cleaner>,
    removals: GlobSet,
    overrides: Vec<(GlobMatcher, PathOverride)>,
    options: CleanOptions,
}

fn compile_glob(pattern: &str) -> Result<Glob> {
    // Removal lists name files as they were on the host (`/etc/shadow`).
    Glob::new(pattern.trim_start_matches('/')).map_err(|e| ArchiveError::pattern(pattern, e))
}

impl ArchiveWalker {
    pub fn new(cleaner: Arc<Cleaner>) -> Self {
        Self {
            cleaner,
            removals: GlobSet::empty(),
            overrides: Vec::new(),
            options: CleanOptions::default(),
        }
    }

    /// Delete files matching any glob instead of cleaning them.
    pub fn with_removals(mut self, globs: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for glob in globs {
            builder.add(compile_glob(glob)?);
        }
        self.removals = builder
            .build()
            .map_err(|e| ArchiveError::pattern(&globs.join(", "), e))?;
        Ok(self)
    }

    pub fn with_overrides(mut self, overrides: &[PathOverride]) -> Result<Self> {
        for o in overrides {
            let matcher = compile_glob(&o.path)?.compile_matcher();
            self.overrides.push((matcher, o.clone()));
        }
        Ok(self)
    }

    /// Run-wide per-call options (`--no-obfuscate`, `--no-redact`).
    pub fn with_options(mut self, options: CleanOptions) -> Self {
        self.options = options;
        self
    }

    fn options_for(&self, path: &Path, rel: &str) -> CleanOptions {
        let mut options = CleanOptions::for_file(path)
            .with_no_obfuscate(self.options.no_obfuscate)
            .with_no_redact(self.options.no_redact);
        for (matcher, o) in &self.overrides {
            if matcher.is_match(rel) {
                options = options
                    .with_no_obfuscate(o.no_obfuscate)
                    .with_no_redact(o.no_redact);
            }
        }
        options
    }

    /// Clean every file under `root`.
    ///
    /// `root` must already have passed the sandbox check. Single-file I/O
    /// errors are logged and counted; pool exhaustion aborts the walk.
    pub fn walk(&self, root: &Path) -> Result<WalkSummary> {
        let mut summary = WalkSummary::default();

        let entries = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !(e.depth() == 1 && e.file_name() == METADATA_DIR));

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let rel = err
                        .path()
                        .map(|p| relative(root, p))
                        .unwrap_or_default();
                    warn!(path = %rel, error = %err, "cannot read archive entry");
                    summary.record_failure(rel);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let rel = relative(root, entry.path());
            summary.files_seen += 1;
            match self.clean_file(entry.path(), &rel) {
                Ok((outcome, stats)) => {
                    debug!(path = %rel, ?outcome, "file cleaned");
                    summary.record(outcome, stats);
                }
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    warn!(path = %rel, error = %err, "skipping file");
                    summary.record_failure(rel);
                }
            }
        }

        self.cleaner.note_truncation(&summary.lines);
        info!(
            files = summary.files_seen,
            rewritten = summary.files_rewritten,
            removed = summary.files_removed_empty + summary.files_removed_by_rule,
            failed = summary.files_failed,
            "archive cleaned"
        );
        Ok(summary)
    }

    fn clean_file(&self, path: &Path, rel: &str) -> Result<(FileOutcome, LineStats)> {
        if self.removals.is_match(rel) {
            fs::remove_file(path)?;
            return Ok((FileOutcome::RemovedByRule, LineStats::default()));
        }

        let bytes = fs::read(path)?;
        if bytes.is_empty() {
            return Ok((FileOutcome::Unchanged, LineStats::default()));
        }
        // Undecodable bytes become U+FFFD rather than passing through raw.
        let text = String::from_utf8_lossy(&bytes);
        let cleaned = self.cleaner.clean_text(&text, &self.options_for(path, rel))?;

        let outcome = if cleaned.is_empty() {
            fs::remove_file(path)?;
            FileOutcome::RemovedEmpty
        } else if cleaned.text.as_bytes() == bytes.as_slice() {
            FileOutcome::Unchanged
        } else {
            write_atomic(path, cleaned.text.as_bytes())?;
            FileOutcome::Rewritten
        };
        Ok((outcome, cleaned.stats))
    }
}

/// Replace `path` with `data` via a sibling temp file and rename, keeping
/// the original permissions.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let permissions = fs::metadata(path)?.permissions();

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    fs::set_permissions(tmp.path(), permissions)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// `path` relative to `root`, with `/` separators.
fn relative(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
