//! Line-drop filter.
//!
//! Operator supplied patterns remove whole lines before any obfuscation runs.
//! Plain patterns match as substrings anywhere in the line; regex patterns use
//! full `regex` syntax, including POSIX bracket classes such as `[[:digit:]]`.

use crate::{RedactionError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// One configured drop rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RuleRepr")]
pub struct DropRule {
    /// Substring or regular expression.
    pub pattern: String,
    /// Whether `pattern` is a regular expression.
    pub regex: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RuleRepr {
    Plain(String),
    Full {
        pattern: String,
        #[serde(default)]
        regex: bool,
    },
}

impl From<RuleRepr> for DropRule {
    fn from(repr: RuleRepr) -> Self {
        match repr {
            RuleRepr::Plain(pattern) => DropRule::plain(pattern),
            RuleRepr::Full { pattern, regex } => DropRule { pattern, regex },
        }
    }
}

impl DropRule {
    pub fn plain(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            regex: false,
        }
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            regex: true,
        }
    }
}

#[derive(Debug, Clone)]
enum Matcher {
    Substring(String),
    Regex(Regex),
}

/// Compiled drop rules.
#[derive(Debug, Clone, Default)]
pub struct LineFilter {
    matchers: Vec<Matcher>,
}

impl LineFilter {
    /// Compile every rule, failing on the first invalid regex.
    pub fn compile(rules: &[DropRule]) -> Result<Self> {
        let mut matchers = Vec::with_capacity(rules.len());
        for rule in rules {
            if rule.pattern.is_empty() {
                return Err(RedactionError::pattern(&rule.pattern, "empty pattern drops every line"));
            }
            let matcher = if rule.regex {
                let re = Regex::new(&rule.pattern)
                    .map_err(|e| RedactionError::pattern(&rule.pattern, e))?;
                Matcher::Regex(re)
            } else {
                Matcher::Substring(rule.pattern.clone())
            };
            matchers.push(matcher);
        }
        Ok(Self { matchers })
    }

    /// Whether any rule matches the line.
    pub fn matches(&self, line: &str) -> bool {
        self.matchers.iter().any(|m| match m {
            Matcher::Substring(s) => line.contains(s.as_str()),
            Matcher::Regex(re) => re.is_match(line),
        })
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}
