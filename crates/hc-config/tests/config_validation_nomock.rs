//! No-mock configuration validation + resolution tests.
//!
//! Covers:
//! - Loading real YAML/JSON files written to disk
//! - Resolution order (CLI > env > config dir > XDG)
//! - Validation of patterns, keywords and globs before any cleaning
//! - Snapshots that carry digests but no configured values

use hc_config::resolve::{resolve_config, ConfigSource};
use hc_config::{LoadedConfig, RedactionConfig, ValidationError};
use hc_redact::{Category, Cleaner, MappingStore};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use tempfile::TempDir;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const ENV_KEYS: &[&str] = &[
    "HOST_COLLECTOR_CONFIG",
    "HOST_COLLECTOR_REDACTION",
    "HOST_COLLECTOR_CONFIG_DIR",
    "XDG_CONFIG_HOME",
];

const REDACTION_YAML: &str = "\
patterns:
  - \"password=\"
  - pattern: \"^abcd\"
    regex: true
keywords: [acme]
files:
  - /etc/shadow
overrides:
  - path: \"insights_commands/rpm_*\"
    no_obfuscate: [hostname]
";

struct EnvGuard {
    keys: Vec<String>,
    saved: Vec<Option<String>>,
}

impl EnvGuard {
    fn new(keys: &[&str]) -> Self {
        let mut saved = Vec::with_capacity(keys.len());
        for key in keys {
            saved.push(env::var(key).ok());
        }
        Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            saved,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (idx, key) in self.keys.iter().enumerate() {
            match self.saved.get(idx).and_then(|v| v.as_ref()) {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
            }
        }
    }
}

fn with_env_lock<T>(f: impl FnOnce() -> T) -> T {
    let _guard = ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .expect("env lock poisoned");
    f()
}

/// Start from a clean environment pointing XDG at an empty directory.
fn isolate(temp: &TempDir) {
    for key in ENV_KEYS {
        env::remove_var(key);
    }
    let xdg = temp.path().join("xdg");
    fs::create_dir_all(&xdg).expect("create xdg dir");
    env::set_var("XDG_CONFIG_HOME", &xdg);
}

fn write_config_dir(dir: &Path, keyword: &str) {
    fs::create_dir_all(dir).expect("create config dir");
    fs::write(dir.join("collector.yaml"), "obfuscate: [ipv4, keyword]\n").expect("write collector");
    fs::write(dir.join("redaction.yaml"), format!("keywords: [{}]\n", keyword))
        .expect("write redaction");
}

/// Explicit files, so the environment of the test run is never consulted.
fn write_explicit(temp: &TempDir) -> (PathBuf, PathBuf) {
    let collector = temp.path().join("collector.yaml");
    let redaction = temp.path().join("redaction.yaml");
    fs::write(&collector, "").expect("write collector");
    fs::write(&redaction, REDACTION_YAML).expect("write redaction");
    (collector, redaction)
}

#[test]
fn test_full_redaction_file_loads_and_validates() {
    let temp = TempDir::new().expect("temp dir");
    let (collector, path) = write_explicit(&temp);
    let loaded = LoadedConfig::load(Some(&collector), Some(&path)).expect("load");
    loaded.validate().expect("valid redaction config");
    assert_eq!(loaded.redaction.patterns.len(), 2);
    assert_eq!(loaded.redaction.files, vec!["/etc/shadow"]);
    assert!(loaded.redaction.overrides[0]
        .no_obfuscate
        .contains(Category::Hostname));

    // The merged settings drive a real cleaner.
    let cleaner = Cleaner::new(
        &loaded.cleaner_config(None),
        Arc::new(MappingStore::with_seed(1)),
    )
    .expect("cleaner");
    let cleaned = cleaner
        .clean_text("abcd drop me\nacme ok\n", &Default::default())
        .expect("clean");
    assert_eq!(cleaned.text, "keyword0 ok\n");
}

#[test]
fn test_validation_rejects_before_cleaning() {
    let cases: &[(&str, u32)] = &[
        ("patterns:\n  regex: [\"(unclosed\"]\n", 62),
        ("keywords: [keyword1]\n", 63),
        ("keywords: [\"   \"]\n", 63),
        ("files: [\"/etc/[\"]\n", 64),
    ];
    for (yaml, code) in cases {
        let config = RedactionConfig::from_yaml(yaml).expect("parse");
        let loaded = LoadedConfig::new(Default::default(), config);
        let err = loaded.validate().expect_err(yaml);
        assert_eq!(err.code(), *code, "{}", yaml);
    }
}

#[test]
fn test_unknown_keys_are_parse_errors() {
    let err = RedactionConfig::from_yaml("keyword: [acme]\n").expect_err("typo key");
    assert!(matches!(err, ValidationError::ParseError(_)));
}

#[test]
fn test_resolve_config_cli_over_env() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);
        let temp = TempDir::new().expect("temp dir");
        isolate(&temp);

        let cli_dir = temp.path().join("cli");
        let env_dir = temp.path().join("env");
        write_config_dir(&cli_dir, "fromcli");
        write_config_dir(&env_dir, "fromenv");
        env::set_var("HOST_COLLECTOR_REDACTION", env_dir.join("redaction.yaml"));
        env::set_var("HOST_COLLECTOR_CONFIG_DIR", &env_dir);

        let cli_redaction = cli_dir.join("redaction.yaml");
        let loaded = LoadedConfig::load(None, Some(&cli_redaction)).expect("load");
        assert_eq!(loaded.paths.redaction_source, ConfigSource::CliArgument);
        assert_eq!(loaded.redaction.keywords, vec!["fromcli"]);
        // The collector file still comes from the config dir.
        assert_eq!(loaded.paths.collector_source, ConfigSource::Environment);
        assert!(loaded.collector.obfuscate.contains(Category::Ipv4));
    });
}

#[test]
fn test_resolve_config_env_over_config_dir() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);
        let temp = TempDir::new().expect("temp dir");
        isolate(&temp);

        let env_dir = temp.path().join("env");
        let config_dir = temp.path().join("config_dir");
        write_config_dir(&env_dir, "direct");
        write_config_dir(&config_dir, "fromdir");
        env::set_var("HOST_COLLECTOR_REDACTION", env_dir.join("redaction.yaml"));
        env::set_var("HOST_COLLECTOR_CONFIG_DIR", &config_dir);

        let paths = resolve_config(None, None);
        assert_eq!(paths.redaction_source, ConfigSource::Environment);
        assert_eq!(paths.redaction.unwrap(), env_dir.join("redaction.yaml"));
        assert_eq!(paths.collector.unwrap(), config_dir.join("collector.yaml"));
    });
}

#[test]
fn test_resolve_config_xdg_then_defaults() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);
        let temp = TempDir::new().expect("temp dir");
        isolate(&temp);

        let paths = resolve_config(None, None);
        if !Path::new("/etc/host-collector").exists() {
            assert_eq!(paths.redaction_source, ConfigSource::BuiltinDefault);
            assert!(paths.redaction.is_none());
        }

        let xdg_dir = temp.path().join("xdg").join("host-collector");
        write_config_dir(&xdg_dir, "fromxdg");
        let loaded = LoadedConfig::load(None, None).expect("load");
        assert_eq!(loaded.paths.redaction_source, ConfigSource::XdgConfig);
        assert_eq!(loaded.redaction.keywords, vec!["fromxdg"]);
    });
}

#[test]
fn test_snapshot_records_digest_not_values() {
    let temp = TempDir::new().expect("temp dir");
    let (collector, path) = write_explicit(&temp);
    let loaded = LoadedConfig::load(Some(&collector), Some(&path)).expect("load");
    let snapshot = loaded.snapshot();
    let json = snapshot.to_json().expect("json");

    assert!(snapshot.redaction.sha256.is_some());
    assert_eq!(snapshot.summary.keyword_count, 1);
    assert_eq!(snapshot.summary.removal_count, 1);
    assert!(!json.contains("acme"));
    assert!(!json.contains("password="));
    assert!(!json.contains("^abcd"));
}
