//! Archive root safety check.
//!
//! The walker rewrites and deletes files in place, so it only ever runs on a
//! collection directory the collector created under a temporary location.

use crate::{ArchiveError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where an archive root is allowed to live.
#[derive(Debug, Clone)]
pub struct SandboxPolicy {
    parents: Vec<PathBuf>,
    pattern: Option<Regex>,
}

impl Default for SandboxPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl SandboxPolicy {
    /// Allow strict descendants of the system temp dir and `/var/tmp`.
    pub fn new() -> Self {
        Self::with_parents(vec![std::env::temp_dir(), PathBuf::from("/var/tmp")])
    }

    pub fn with_parents(parents: Vec<PathBuf>) -> Self {
        Self {
            parents,
            pattern: None,
        }
    }

    /// Additionally require the canonical root to match `pattern`.
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self> {
        let re = Regex::new(pattern).map_err(|e| ArchiveError::pattern(pattern, e))?;
        self.pattern = Some(re);
        Ok(self)
    }

    /// Resolve `root` and check it. Returns the canonical path.
    pub fn check(&self, root: &Path) -> Result<PathBuf> {
        let canonical = root
            .canonicalize()
            .map_err(|e| ArchiveError::unsafe_root(root, format!("cannot resolve path: {}", e)))?;
        if !canonical.is_dir() {
            return Err(ArchiveError::unsafe_root(root, "not a directory"));
        }

        let inside = self
            .parents
            .iter()
            .filter_map(|parent| parent.canonicalize().ok())
            .any(|parent| canonical != parent && canonical.starts_with(&parent));
        if !inside {
            return Err(ArchiveError::unsafe_root(
                root,
                "not inside a temporary collection directory",
            ));
        }

        if let Some(re) = &self.pattern {
            if !re.is_match(&canonical.to_string_lossy()) {
                return Err(ArchiveError::unsafe_root(
                    root,
                    format!("does not match archive pattern '{}'", re.as_str()),
                ));
            }
        }

        debug!(root = %canonical.display(), "archive root accepted");
        Ok(canonical)
    }
}
