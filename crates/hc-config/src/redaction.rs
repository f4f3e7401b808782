//! Redaction rules (`redaction.yaml`).
//!
//! ```yaml
//! patterns:
//!   - "password="            # substring
//!   - pattern: "^abcd"
//!     regex: true
//! keywords: [acme, project-x]
//! files:
//!   - /etc/shadow
//! overrides:
//!   - path: "insights_commands/rpm_*"
//!     no_obfuscate: [hostname]
//! ```
//!
//! `patterns` also accepts the map form `{regex: [...]}`, where every entry
//! is a regular expression.

use crate::document::{parse_document, read_document, DocumentFormat};
use crate::validate::ValidationResult;
use hc_archive::PathOverride;
use hc_redact::DropRule;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Line-drop rules in either accepted shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PatternsRepr")]
pub struct PatternList(Vec<DropRule>);

#[derive(Deserialize)]
#[serde(untagged)]
enum PatternsRepr {
    List(Vec<DropRule>),
    Regex { regex: Vec<String> },
}

impl From<PatternsRepr> for PatternList {
    fn from(repr: PatternsRepr) -> Self {
        match repr {
            PatternsRepr::List(rules) => PatternList(rules),
            PatternsRepr::Regex { regex } => {
                PatternList(regex.into_iter().map(DropRule::regex).collect())
            }
        }
    }
}

impl From<Vec<DropRule>> for PatternList {
    fn from(rules: Vec<DropRule>) -> Self {
        PatternList(rules)
    }
}

impl PatternList {
    pub fn rules(&self) -> &[DropRule] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Operator redaction rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RedactionConfig {
    /// Lines matching any pattern are dropped.
    pub patterns: PatternList,

    /// Keywords replaced by `keywordN` labels.
    pub keywords: Vec<String>,

    /// Files removed from the archive (host paths or globs).
    pub files: Vec<String>,

    /// Per-path relaxations.
    pub overrides: Vec<PathOverride>,
}

impl RedactionConfig {
    /// Load from a JSON or YAML file.
    pub fn from_file(path: &Path) -> ValidationResult<Self> {
        Ok(read_document(path)?.0)
    }

    /// Parse from a YAML (or JSON) string.
    pub fn from_yaml(content: &str) -> ValidationResult<Self> {
        parse_document(content, DocumentFormat::Yaml)
    }

    /// Append keywords not already configured.
    pub fn add_keywords<I, S>(&mut self, keywords: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for keyword in keywords {
            let keyword = keyword.into();
            if !self.keywords.contains(&keyword) {
                self.keywords.push(keyword);
            }
        }
    }
}
