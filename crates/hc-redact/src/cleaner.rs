//! Content cleaner.
//!
//! Runs every line of a document through the fixed stage order:
//!
//! 1. line-drop filter
//! 2. keyword substitution
//! 3. password masking
//! 4. network identifiers (IPv6, IPv4, MAC)
//! 5. host name substitution
//!
//! Stages 1 and 3 are redaction and are switched off together by
//! [`CleanOptions::no_redact`]. Stages 2, 4 and 5 are obfuscation and follow
//! the enabled [`CategorySet`] minus any per-call `no_obfuscate` categories.
//! Cleaning already cleaned output with the same configuration changes
//! nothing.

use crate::filter::{DropRule, LineFilter};
use crate::hostname::HostnameSubstituter;
use crate::keyword::{KeywordMatch, KeywordSubstituter};
use crate::network::{substitute_ipv4, substitute_ipv6, substitute_mac};
use crate::password::mask_passwords;
use crate::splice::WidthMode;
use crate::{Category, CategorySet, MappingStore, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::ops::AddAssign;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Lines longer than this many bytes are truncated before cleaning, and no
/// cleaned line is longer.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 1024 * 1024;

/// Run-wide cleaner configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanerConfig {
    /// Lines matching any rule are dropped.
    pub drop_rules: Vec<DropRule>,
    /// Keywords replaced by `keywordN` labels.
    pub keywords: Vec<String>,
    pub keyword_match: KeywordMatch,
    /// Obfuscation categories enabled for the run.
    pub obfuscate: CategorySet,
    /// The host's FQDN or short name.
    pub hostname: Option<String>,
    pub max_line_length: usize,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        // Keywords are an explicit operator request; network and host name
        // obfuscation are opt-in.
        Self {
            drop_rules: Vec::new(),
            keywords: Vec::new(),
            keyword_match: KeywordMatch::default(),
            obfuscate: [Category::Keyword].into_iter().collect(),
            hostname: None,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

/// Per-call overrides. Never mutates the cleaner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanOptions {
    /// Categories to leave alone for this call.
    pub no_obfuscate: CategorySet,
    /// Skip line dropping and password masking.
    pub no_redact: bool,
    pub width_mode: WidthMode,
}

impl CleanOptions {
    /// Options for a file, keeping column widths in `netstat` output.
    pub fn for_file(path: &Path) -> Self {
        let netstat = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.contains("netstat"));
        Self {
            width_mode: if netstat {
                WidthMode::Preserve
            } else {
                WidthMode::Natural
            },
            ..Self::default()
        }
    }

    pub fn with_no_obfuscate(mut self, categories: CategorySet) -> Self {
        self.no_obfuscate = self.no_obfuscate.union(categories);
        self
    }

    pub fn with_no_redact(mut self, no_redact: bool) -> Self {
        self.no_redact = self.no_redact || no_redact;
        self
    }
}

/// Counters for one or more cleaned lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineStats {
    pub lines_seen: u64,
    pub lines_dropped: u64,
    pub lines_truncated: u64,
    pub passwords_masked: u64,
    pub ipv4: u64,
    pub ipv6: u64,
    pub mac: u64,
    pub hostname: u64,
    pub keyword: u64,
}

impl LineStats {
    /// Substitutions made for a category.
    pub fn substitutions(&self, category: Category) -> u64 {
        match category {
            Category::Ipv4 => self.ipv4,
            Category::Ipv6 => self.ipv6,
            Category::Mac => self.mac,
            Category::Hostname => self.hostname,
            Category::Keyword => self.keyword,
        }
    }

    pub fn total_substitutions(&self) -> u64 {
        Category::ALL.iter().map(|c| self.substitutions(*c)).sum()
    }

    fn record(&mut self, category: Category, n: usize) {
        let n = n as u64;
        match category {
            Category::Ipv4 => self.ipv4 += n,
            Category::Ipv6 => self.ipv6 += n,
            Category::Mac => self.mac += n,
            Category::Hostname => self.hostname += n,
            Category::Keyword => self.keyword += n,
        }
    }
}

impl AddAssign for LineStats {
    fn add_assign(&mut self, rhs: Self) {
        self.lines_seen += rhs.lines_seen;
        self.lines_dropped += rhs.lines_dropped;
        self.lines_truncated += rhs.lines_truncated;
        self.passwords_masked += rhs.passwords_masked;
        self.ipv4 += rhs.ipv4;
        self.ipv6 += rhs.ipv6;
        self.mac += rhs.mac;
        self.hostname += rhs.hostname;
        self.keyword += rhs.keyword;
    }
}

/// A cleaned document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedText {
    pub text: String,
    pub stats: LineStats,
}

impl CleanedText {
    /// Whether every line was dropped.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// The compiled line pipeline, bound to one run's mapping store.
#[derive(Debug)]
pub struct Cleaner {
    filter: LineFilter,
    keywords: KeywordSubstituter,
    hostname: Option<HostnameSubstituter>,
    obfuscate: CategorySet,
    max_line_length: usize,
    store: Arc<MappingStore>,
}

impl Cleaner {
    /// Compile the configuration. Fails on invalid patterns or keywords.
    pub fn new(config: &CleanerConfig, store: Arc<MappingStore>) -> Result<Self> {
        let filter = LineFilter::compile(&config.drop_rules)?;
        let keywords = KeywordSubstituter::new(&config.keywords, config.keyword_match)?;
        store.exclude_from_labels(keywords.keywords());

        let hostname = config
            .hostname
            .as_deref()
            .and_then(HostnameSubstituter::new);
        if config.obfuscate.contains(Category::Hostname) && hostname.is_none() {
            warn!("hostname obfuscation enabled but no hostname is known");
        }

        debug!(
            drop_rules = filter.len(),
            keywords = keywords.keywords().len(),
            obfuscate = ?config.obfuscate.iter().collect::<Vec<_>>(),
            "cleaner ready"
        );

        Ok(Self {
            filter,
            keywords,
            hostname,
            obfuscate: config.obfuscate,
            max_line_length: config.max_line_length.max(1),
            store,
        })
    }

    pub fn store(&self) -> &Arc<MappingStore> {
        &self.store
    }

    /// Categories obfuscated under the given options.
    pub fn enabled(&self, options: &CleanOptions) -> CategorySet {
        self.obfuscate.difference(options.no_obfuscate)
    }

    /// Clean one line. `None` means the line is dropped.
    pub fn clean_line(&self, line: &str, options: &CleanOptions) -> Result<Option<String>> {
        let mut stats = LineStats::default();
        self.process(line, self.enabled(options), options, &mut stats)
    }

    /// Clean a whole document, keeping each surviving line's terminator.
    pub fn clean_text(&self, text: &str, options: &CleanOptions) -> Result<CleanedText> {
        let enabled = self.enabled(options);
        let mut stats = LineStats::default();
        let mut out = String::with_capacity(text.len());

        for raw in text.split_inclusive('\n') {
            let (body, ending) = split_line_ending(raw);
            if let Some(cleaned) = self.process(body, enabled, options, &mut stats)? {
                out.push_str(&cleaned);
                out.push_str(ending);
            }
        }

        Ok(CleanedText { text: out, stats })
    }

    /// One debug notice for all lines cut in a run. Callers pass their
    /// accumulated counters once, after the last document.
    pub fn note_truncation(&self, stats: &LineStats) {
        if stats.lines_truncated > 0 {
            debug!(
                lines = stats.lines_truncated,
                max_line_length = self.max_line_length,
                "truncated overlong lines"
            );
        }
    }

    fn process(
        &self,
        line: &str,
        enabled: CategorySet,
        options: &CleanOptions,
        stats: &mut LineStats,
    ) -> Result<Option<String>> {
        stats.lines_seen += 1;

        let mut current = Cow::Borrowed(line);
        let mut truncated = false;
        if let Some(cut) = truncate(line, self.max_line_length) {
            current = Cow::Borrowed(cut);
            truncated = true;
        }

        if !options.no_redact && self.filter.matches(&current) {
            stats.lines_truncated += u64::from(truncated);
            stats.lines_dropped += 1;
            return Ok(None);
        }

        if enabled.contains(Category::Keyword) && !self.keywords.is_empty() {
            let (out, n) = self.keywords.apply(&current, &self.store, !options.no_redact);
            stats.record(Category::Keyword, n);
            if let Some(s) = owned(out) {
                current = Cow::Owned(s);
            }
        }

        if !options.no_redact {
            let (out, n) = mask_passwords(&current);
            stats.passwords_masked += n as u64;
            if let Some(s) = owned(out) {
                current = Cow::Owned(s);
            }
        }

        if enabled.contains(Category::Ipv6) {
            let (out, n) = substitute_ipv6(&current, &self.store, options.width_mode)?;
            stats.record(Category::Ipv6, n);
            if let Some(s) = owned(out) {
                current = Cow::Owned(s);
            }
        }
        if enabled.contains(Category::Ipv4) {
            let (out, n) = substitute_ipv4(&current, &self.store, options.width_mode)?;
            stats.record(Category::Ipv4, n);
            if let Some(s) = owned(out) {
                current = Cow::Owned(s);
            }
        }
        if enabled.contains(Category::Mac) {
            let (out, n) = substitute_mac(&current, &self.store, options.width_mode)?;
            stats.record(Category::Mac, n);
            if let Some(s) = owned(out) {
                current = Cow::Owned(s);
            }
        }

        if enabled.contains(Category::Hostname) {
            if let Some(hostname) = &self.hostname {
                let (out, n) = hostname.apply(&current, &self.store)?;
                stats.record(Category::Hostname, n);
                if let Some(s) = owned(out) {
                    current = Cow::Owned(s);
                }
            }
        }

        // Images can be longer than what they replace; a cleaned line never
        // exceeds the limit, so a second pass never cuts it again.
        let mut cleaned = current.into_owned();
        if let Some(len) = truncate(&cleaned, self.max_line_length).map(str::len) {
            cleaned.truncate(len);
            truncated = true;
        }
        stats.lines_truncated += u64::from(truncated);
        Ok(Some(cleaned))
    }
}

/// `line` cut to at most `max` bytes on a char boundary, if it is longer.
fn truncate(line: &str, max: usize) -> Option<&str> {
    if line.len() <= max {
        return None;
    }
    let mut end = max;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    Some(&line[..end])
}

fn owned(value: Cow<'_, str>) -> Option<String> {
    match value {
        Cow::Owned(s) => Some(s),
        Cow::Borrowed(_) => None,
    }
}

fn split_line_ending(raw: &str) -> (&str, &str) {
    if let Some(body) = raw.strip_suffix("\r\n") {
        (body, &raw[body.len()..])
    } else if let Some(body) = raw.strip_suffix('\n') {
        (body, &raw[body.len()..])
    } else {
        (raw, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cleaner(config: CleanerConfig) -> Cleaner {
        Cleaner::new(&config, Arc::new(MappingStore::with_seed(11))).unwrap()
    }

    fn network_config() -> CleanerConfig {
        CleanerConfig {
            obfuscate: CategorySet::all(),
            hostname: Some("db01.corp.internal".to_string()),
            ..CleanerConfig::default()
        }
    }

    #[test]
    fn test_first_ipv4_allocation() {
        let c = cleaner(network_config());
        let out = c
            .clean_line("radius_ip_1=10.0.0.1", &CleanOptions::default())
            .unwrap();
        assert_eq!(out.as_deref(), Some("radius_ip_1=10.230.230.1"));
    }

    #[test]
    fn test_drop_rule_removes_line() {
        let c = cleaner(CleanerConfig {
            drop_rules: vec![DropRule::regex("^abcd")],
            ..CleanerConfig::default()
        });
        let cleaned = c
            .clean_text("abcd 1\nkeep\nabcd 2\n", &CleanOptions::default())
            .unwrap();
        assert_eq!(cleaned.text, "keep\n");
        assert_eq!(cleaned.stats.lines_seen, 3);
        assert_eq!(cleaned.stats.lines_dropped, 2);

        let all_dropped = c.clean_text("abcd\n", &CleanOptions::default()).unwrap();
        assert!(all_dropped.is_empty());
    }

    #[test]
    fn test_stage_order_keyword_before_password() {
        let c = cleaner(CleanerConfig {
            keywords: vec!["acme".to_string()],
            ..CleanerConfig::default()
        });
        let out = c
            .clean_line("acme_password=acme-secret", &CleanOptions::default())
            .unwrap();
        assert_eq!(out.as_deref(), Some("keyword0_password=********"));
    }

    #[test]
    fn test_no_redact_keeps_drop_lines_and_passwords() {
        let c = cleaner(CleanerConfig {
            drop_rules: vec![DropRule::plain("secret")],
            obfuscate: CategorySet::all(),
            ..CleanerConfig::default()
        });
        let options = CleanOptions::default().with_no_redact(true);
        let out = c.clean_line("secret password=x 10.1.1.1", &options).unwrap();
        assert_eq!(out.as_deref(), Some("secret password=x 10.230.230.1"));
    }

    #[test]
    fn test_no_obfuscate_per_call() {
        let c = cleaner(network_config());
        let options =
            CleanOptions::default().with_no_obfuscate([Category::Ipv4].into_iter().collect());
        let out = c.clean_line("10.1.1.1 db01", &options).unwrap().unwrap();
        assert!(out.starts_with("10.1.1.1 "));
        assert!(!out.contains("db01"));
        // The cleaner itself is unchanged.
        let out = c.clean_line("10.1.1.1", &CleanOptions::default()).unwrap();
        assert_eq!(out.as_deref(), Some("10.230.230.1"));
    }

    #[test]
    fn test_keeps_line_endings() {
        let c = cleaner(network_config());
        let cleaned = c
            .clean_text("a 10.0.0.1\r\nb\nc", &CleanOptions::default())
            .unwrap();
        assert_eq!(cleaned.text, "a 10.230.230.1\r\nb\nc");
    }

    #[test]
    fn test_truncates_on_char_boundary() {
        let c = cleaner(CleanerConfig {
            max_line_length: 4,
            ..CleanerConfig::default()
        });
        let out = c.clean_line("abcé123", &CleanOptions::default()).unwrap();
        assert_eq!(out.as_deref(), Some("abc"));

        let cleaned = c.clean_text("abcdef\nab\n", &CleanOptions::default()).unwrap();
        assert_eq!(cleaned.text, "abcd\nab\n");
        assert_eq!(cleaned.stats.lines_truncated, 1);
    }

    #[test]
    fn test_grown_line_is_capped_and_stable() {
        let config = CleanerConfig {
            obfuscate: [Category::Ipv4].into_iter().collect(),
            max_line_length: 20,
            ..CleanerConfig::default()
        };
        let once = cleaner(config.clone())
            .clean_text("a 1.1.1.1 b 2.2.2.2 c\n", &CleanOptions::default())
            .unwrap();
        assert_eq!(once.text, "a 10.230.230.1 b 10.\n");
        assert_eq!(once.stats.lines_truncated, 1);

        let twice = cleaner(config)
            .clean_text(&once.text, &CleanOptions::default())
            .unwrap();
        assert_eq!(twice.text, once.text);
        assert_eq!(twice.stats.lines_truncated, 0);
    }

    #[test]
    fn test_netstat_file_preserves_columns() {
        let c = cleaner(network_config());
        let options = CleanOptions::for_file(Path::new("sos_commands/networking/netstat_-neopa"));
        assert_eq!(options.width_mode, WidthMode::Preserve);

        let line = "tcp   0   0 192.168.122.100:22     192.168.122.1:50312    ESTABLISHED";
        let out = c.clean_line(line, &options).unwrap().unwrap();
        assert_eq!(out.find("ESTABLISHED"), line.find("ESTABLISHED"));
    }

    #[test]
    fn test_stats_accumulate() {
        let mut total = LineStats::default();
        total += LineStats {
            lines_seen: 2,
            ipv4: 1,
            ..LineStats::default()
        };
        total += LineStats {
            lines_seen: 1,
            mac: 3,
            ..LineStats::default()
        };
        assert_eq!(total.lines_seen, 3);
        assert_eq!(total.total_substitutions(), 4);
        assert_eq!(total.substitutions(Category::Mac), 3);
    }

    #[test]
    fn test_invalid_keyword_rejected() {
        let config = CleanerConfig {
            keywords: vec!["word".to_string()],
            ..CleanerConfig::default()
        };
        assert!(Cleaner::new(&config, Arc::new(MappingStore::new())).is_err());
    }

    #[test]
    fn test_rerun_is_stable() {
        let config = CleanerConfig {
            keywords: vec!["name".to_string(), "day".to_string()],
            drop_rules: vec![DropRule::plain("DROPME")],
            ..network_config()
        };
        let text = "db01.corp.internal name 10.0.0.1 fe80::1\n\
                    link/ether 52:54:00:ab:cd:ef password: hunter2\n\
                    DROPME\n\
                    today db01 up\n";
        let once = cleaner(config.clone())
            .clean_text(text, &CleanOptions::default())
            .unwrap();
        let twice = Cleaner::new(&config, Arc::new(MappingStore::new()))
            .unwrap()
            .clean_text(&once.text, &CleanOptions::default())
            .unwrap();
        assert_eq!(twice.text, once.text);
    }
}
