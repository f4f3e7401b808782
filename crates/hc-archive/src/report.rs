//! Mapping reports and the redaction report.
//!
//! Mapping reports hold the original values and stay on the host, one CSV
//! per category. The redaction report goes into the archive's metadata
//! directory and carries counts only.

use crate::walker::{WalkSummary, METADATA_DIR};
use crate::{ArchiveError, Result};
use chrono::{DateTime, Utc};
use hc_redact::{Category, CategorySet, MappingStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Current redaction report schema version.
pub const REPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Redaction report file name inside [`METADATA_DIR`].
pub const REDACTION_REPORT_FILE: &str = "redaction_report.json";

/// Mode of the CSV mapping reports.
pub const MAPPING_REPORT_MODE: u32 = 0o600;

/// Create a report or facts directory. Failure is [`ArchiveError::OutputDir`].
pub fn create_output_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| ArchiveError::OutputDir {
        path: dir.to_path_buf(),
        source,
    })
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Write `<archive_name>-<category>.csv` for each enabled category that has
/// at least one mapping, in store insertion order.
pub fn write_mapping_reports(
    store: &MappingStore,
    enabled: CategorySet,
    dir: &Path,
    archive_name: &str,
) -> Result<Vec<PathBuf>> {
    create_output_dir(dir)?;

    let mut written = Vec::new();
    for category in enabled.iter() {
        let entries = store.entries(category);
        if entries.is_empty() {
            continue;
        }

        let label = category.label();
        let mut csv = format!("Obfuscated {},Original {}\n", label, label);
        for mapping in &entries {
            csv.push_str(&csv_field(&mapping.obfuscated));
            csv.push(',');
            csv.push_str(&csv_field(&mapping.original));
            csv.push('\n');
        }

        let path = dir.join(format!("{}-{}.csv", archive_name, category));
        fs::write(&path, csv)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(MAPPING_REPORT_MODE))?;
        }
        info!(category = %category, entries = entries.len(), path = %path.display(), "wrote mapping report");
        written.push(path);
    }
    Ok(written)
}

/// What was done to an archive, without any original values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionReport {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub tool_version: String,
    /// Categories obfuscated for the run.
    pub obfuscate: CategorySet,
    /// Distinct values replaced, per category.
    pub mapping_counts: BTreeMap<Category, usize>,
    pub summary: WalkSummary,
    /// Configuration provenance (sources and digests).
    pub config: serde_json::Value,
}

impl RedactionReport {
    pub fn new(
        summary: &WalkSummary,
        store: &MappingStore,
        obfuscate: CategorySet,
        config: serde_json::Value,
    ) -> Self {
        let mut summary = summary.clone();
        // Paths can carry host names.
        summary.failed_paths.clear();

        Self {
            schema_version: REPORT_SCHEMA_VERSION.to_string(),
            generated_at: Utc::now(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            obfuscate,
            mapping_counts: Category::ALL
                .iter()
                .map(|c| (*c, store.len(*c)))
                .collect(),
            summary,
            config,
        }
    }

    /// Write into `<root>/meta_data/`.
    pub fn write(&self, root: &Path) -> Result<PathBuf> {
        let dir = root.join(METADATA_DIR);
        create_output_dir(&dir)?;
        let path = dir.join(REDACTION_REPORT_FILE);
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use tempfile::TempDir;

    #[test]
    fn test_csv_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_reports_only_enabled_non_empty() {
        let dir = TempDir::new().unwrap();
        let store = MappingStore::with_seed(1);
        store.ipv4(Ipv4Addr::new(192, 168, 0, 9)).unwrap();
        store.ipv4(Ipv4Addr::new(192, 168, 0, 1)).unwrap();
        store.keyword("acme");

        let enabled: CategorySet = [Category::Ipv4, Category::Mac].into_iter().collect();
        let written = write_mapping_reports(&store, enabled, dir.path(), "collector-abc").unwrap();
        assert_eq!(written, vec![dir.path().join("collector-abc-ipv4.csv")]);

        let csv = fs::read_to_string(&written[0]).unwrap();
        assert_eq!(
            csv,
            "Obfuscated IPv4,Original IPv4\n10.230.230.1,192.168.0.9\n10.230.230.2,192.168.0.1\n"
        );
    }

    #[test]
    fn test_output_dir_failure_is_fatal() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();

        let store = MappingStore::with_seed(1);
        let err = write_mapping_reports(&store, CategorySet::all(), &blocker.join("sub"), "a")
            .unwrap_err();
        assert!(matches!(err, ArchiveError::OutputDir { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_redaction_report_has_no_originals() {
        let dir = TempDir::new().unwrap();
        let store = MappingStore::with_seed(1);
        store.ipv4(Ipv4Addr::new(192, 168, 7, 7)).unwrap();

        let summary = WalkSummary {
            files_seen: 1,
            files_failed: 1,
            failed_paths: vec!["var/log/db01.log".to_string()],
            ..WalkSummary::default()
        };
        let report = RedactionReport::new(
            &summary,
            &store,
            CategorySet::all(),
            serde_json::json!({"sources": []}),
        );
        let path = report.write(dir.path()).unwrap();
        assert_eq!(path, dir.path().join("meta_data/redaction_report.json"));

        let json = fs::read_to_string(&path).unwrap();
        assert!(!json.contains("192.168.7.7"));
        assert!(!json.contains("db01"));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["mapping_counts"]["ipv4"], 1);
        assert_eq!(value["summary"]["files_failed"], 1);
    }
}
