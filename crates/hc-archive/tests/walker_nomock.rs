//! No-mock archive integration tests.
//!
//! Builds real archive trees on disk and cleans them:
//! - Consistent images across files of one archive
//! - Fully-dropped files removed, metadata untouched
//! - Removal globs and per-path overrides
//! - A second pass over a cleaned archive is byte-identical
//! - Reports and facts written from the final store

use hc_archive::{
    write_mapping_reports, ArchiveWalker, FactsRecord, PathOverride, RedactionReport,
    SandboxPolicy,
};
use hc_redact::{Category, CategorySet, Cleaner, CleanerConfig, DropRule, MappingStore};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

// ============================================================================
// Helpers
// ============================================================================

const HOSTNAME: &str = "db01.corp.internal";

fn config() -> CleanerConfig {
    CleanerConfig {
        obfuscate: CategorySet::all(),
        keywords: vec!["acme".to_string()],
        drop_rules: vec![DropRule::regex("^abcd")],
        hostname: Some(HOSTNAME.to_string()),
        ..CleanerConfig::default()
    }
}

/// A small archive resembling a real collection.
fn build_archive() -> TempDir {
    let dir = tempfile::Builder::new().prefix("collector-").tempdir().unwrap();
    let files: &[(&str, &str)] = &[
        ("etc/hostname", "db01.corp.internal\n"),
        (
            "etc/hosts",
            "127.0.0.1 localhost\n192.168.122.15 db01.corp.internal db01\n",
        ),
        (
            "insights_commands/ip_addr",
            "2: eth0: <BROADCAST,MULTICAST,UP> mtu 1500\n    link/ether 52:54:00:12:34:56 brd ff:ff:ff:ff:ff:ff\n    inet 192.168.122.15/24 brd 192.168.122.255 scope global eth0\n    inet6 fe80::5054:ff:fe12:3456/64 scope link\n",
        ),
        (
            "insights_commands/netstat_-neopa",
            "tcp        0      0 192.168.122.15:22       192.168.122.1:50312     ESTABLISHED\n",
        ),
        ("var/log/messages", "Jan  1 00:00:00 db01 sshd[1]: acme login ok\n"),
        ("etc/dropped.conf", "abcd secret\nabcd more\n"),
        ("etc/shadow", "root:$6$hash:19000::::::\n"),
        ("meta_data/branch_info", "{\"remote_branch\": \"db01.corp.internal\"}\n"),
    ];
    for (rel, content) in files {
        let path = dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    dir
}

fn snapshot_tree(root: &Path) -> BTreeMap<String, String> {
    list_files(root)
        .into_iter()
        .map(|p| {
            let rel = p.strip_prefix(root).unwrap().to_string_lossy().into_owned();
            (rel, fs::read_to_string(&p).unwrap())
        })
        .collect()
}

fn list_files(dir: &Path) -> Vec<std::path::PathBuf> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            out.extend(list_files(&path));
        } else {
            out.push(path);
        }
    }
    out
}

fn clean(root: &Path, seed: u64) -> (Arc<MappingStore>, hc_archive::WalkSummary) {
    let store = Arc::new(MappingStore::with_seed(seed));
    let cleaner = Cleaner::new(&config(), store.clone()).unwrap();
    let root = SandboxPolicy::new().check(root).unwrap();
    let summary = ArchiveWalker::new(Arc::new(cleaner))
        .with_removals(&["/etc/shadow".to_string()])
        .unwrap()
        .walk(&root)
        .unwrap();
    (store, summary)
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_archive_is_cleaned_consistently() {
    let archive = build_archive();
    let root = archive.path();
    let (store, summary) = clean(root, 1);

    assert_eq!(summary.files_seen, 7);
    assert_eq!(summary.files_removed_by_rule, 1);
    assert_eq!(summary.files_removed_empty, 1);
    assert_eq!(summary.files_failed, 0);
    assert!(!root.join("etc/shadow").exists());
    assert!(!root.join("etc/dropped.conf").exists());

    let fqdn_image = store.lookup(Category::Hostname, HOSTNAME).unwrap();
    let short_image = store.lookup(Category::Hostname, "db01").unwrap();
    assert!(fqdn_image.ends_with(".example.com"));
    assert!(fqdn_image.starts_with(&short_image));

    assert_eq!(
        fs::read_to_string(root.join("etc/hostname")).unwrap(),
        format!("{}\n", fqdn_image)
    );
    let hosts = fs::read_to_string(root.join("etc/hosts")).unwrap();
    assert!(hosts.contains(&format!("{} {}", fqdn_image, short_image)));

    // Same address in different files, same image.
    let ip_image = store.lookup(Category::Ipv4, "192.168.122.15").unwrap();
    let ip_addr = fs::read_to_string(root.join("insights_commands/ip_addr")).unwrap();
    assert!(hosts.contains(&ip_image));
    assert!(ip_addr.contains(&format!("inet {}/24", ip_image)));

    let messages = fs::read_to_string(root.join("var/log/messages")).unwrap();
    assert_eq!(
        messages,
        format!("Jan  1 00:00:00 {} sshd[1]: keyword0 login ok\n", short_image)
    );

    // Metadata is never touched.
    assert!(fs::read_to_string(root.join("meta_data/branch_info"))
        .unwrap()
        .contains(HOSTNAME));
}

#[test]
fn test_netstat_columns_survive() {
    let archive = build_archive();
    let root = archive.path();
    let before = fs::read_to_string(root.join("insights_commands/netstat_-neopa")).unwrap();
    clean(root, 1);
    let after = fs::read_to_string(root.join("insights_commands/netstat_-neopa")).unwrap();

    assert!(!after.contains("192.168.122"));
    assert_eq!(after.find("ESTABLISHED"), before.find("ESTABLISHED"));
}

#[test]
fn test_second_pass_is_byte_identical() {
    let archive = build_archive();
    let root = archive.path();
    clean(root, 1);
    let first = snapshot_tree(root);

    let (_, summary) = clean(root, 2);
    assert_eq!(snapshot_tree(root), first);
    assert_eq!(summary.files_rewritten, 0);
}

#[test]
fn test_overrides_relax_single_paths() {
    let archive = build_archive();
    let root = archive.path();
    let store = Arc::new(MappingStore::with_seed(1));
    let cleaner = Cleaner::new(&config(), store).unwrap();

    ArchiveWalker::new(Arc::new(cleaner))
        .with_overrides(&[PathOverride {
            path: "etc/hosts".to_string(),
            no_obfuscate: [Category::Ipv4].into_iter().collect(),
            no_redact: false,
        }])
        .unwrap()
        .walk(root)
        .unwrap();

    let hosts = fs::read_to_string(root.join("etc/hosts")).unwrap();
    assert!(hosts.contains("192.168.122.15"));
    assert!(!hosts.contains(HOSTNAME));
    let ip_addr = fs::read_to_string(root.join("insights_commands/ip_addr")).unwrap();
    assert!(!ip_addr.contains("192.168.122.15"));
}

#[test]
fn test_non_utf8_content_is_still_cleaned() {
    let archive = build_archive();
    let root = archive.path();
    fs::write(root.join("var/log/binary"), b"\xff\xfe addr 10.9.9.9\n").unwrap();
    clean(root, 1);

    let bytes = fs::read(root.join("var/log/binary")).unwrap();
    let text = String::from_utf8(bytes).unwrap();
    assert!(!text.contains("10.9.9.9"));
    assert!(text.contains('\u{FFFD}'));
}

#[test]
fn test_symlinks_are_not_followed() {
    let archive = build_archive();
    let root = archive.path();
    let outside = TempDir::new().unwrap();
    let target = outside.path().join("target");
    fs::write(&target, "10.1.2.3\n").unwrap();
    std::os::unix::fs::symlink(&target, root.join("etc/link")).unwrap();

    clean(root, 1);
    assert_eq!(fs::read_to_string(&target).unwrap(), "10.1.2.3\n");
}

#[test]
fn test_reports_and_facts_from_final_store() {
    use std::os::unix::fs::PermissionsExt;

    let archive = build_archive();
    let root = archive.path();
    let (store, summary) = clean(root, 1);
    let out = TempDir::new().unwrap();

    let written =
        write_mapping_reports(&store, CategorySet::all(), out.path(), "collector-test").unwrap();
    let names: Vec<String> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            "collector-test-ipv4.csv",
            "collector-test-ipv6.csv",
            "collector-test-mac.csv",
            "collector-test-hostname.csv",
            "collector-test-keyword.csv",
        ]
    );
    let hostname_csv = fs::read_to_string(out.path().join("collector-test-hostname.csv")).unwrap();
    assert!(hostname_csv.starts_with("Obfuscated Hostname,Original Hostname\n"));
    assert!(hostname_csv.contains(HOSTNAME));

    let facts_path = out.path().join("facts/obfuscation.facts");
    FactsRecord::from_store(&store, CategorySet::all())
        .write(&facts_path)
        .unwrap();
    let mode = fs::metadata(&facts_path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o644);

    let report = RedactionReport::new(&summary, &store, CategorySet::all(), serde_json::json!({}));
    report.write(root).unwrap();
    let json = fs::read_to_string(root.join("meta_data/redaction_report.json")).unwrap();
    assert!(!json.contains("192.168.122.15"));
    assert!(!json.contains(HOSTNAME));
}
