//! Archive-level cleaning for host collector.
//!
//! Applies one [`hc_redact::Cleaner`] to every file of a collected archive,
//! then writes the artifacts that describe the run.
//!
//! # Layout
//!
//! - `meta_data/`: collection provenance, skipped by the walker; receives
//!   `redaction_report.json` (counts only)
//! - everything else: cleaned in place, or removed when nothing is left
//!
//! Mapping CSVs (`<archive-name>-<category>.csv`) and the facts sidecar are
//! written outside the archive because they contain original values.
//!
//! # Example
//!
//! ```no_run
//! use hc_archive::{ArchiveWalker, SandboxPolicy};
//! use hc_redact::{Cleaner, CleanerConfig, MappingStore};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let store = Arc::new(MappingStore::new());
//! let cleaner = Cleaner::new(&CleanerConfig::default(), store.clone()).unwrap();
//! let root = SandboxPolicy::new().check(Path::new("/var/tmp/collector-x/archive")).unwrap();
//! let summary = ArchiveWalker::new(Arc::new(cleaner)).walk(&root).unwrap();
//! println!("{} files cleaned", summary.files_rewritten);
//! ```

pub mod error;
pub mod facts;
pub mod report;
pub mod sandbox;
pub mod walker;

pub use error::{ArchiveError, Result};
pub use facts::{CategoryFacts, FactsRecord, FACTS_MODE};
pub use report::{
    create_output_dir, write_mapping_reports, RedactionReport, REDACTION_REPORT_FILE,
};
pub use sandbox::SandboxPolicy;
pub use walker::{ArchiveWalker, FileOutcome, PathOverride, WalkSummary, METADATA_DIR};
