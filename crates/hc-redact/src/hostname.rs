//! Host name substitution.
//!
//! Replaces the host's fully-qualified name with `<label>.example.com` and
//! its short name with `<label>`. Names are compared case-sensitively and
//! only where they are not part of a longer host name.

use crate::splice::{splice, Substitution, WidthMode};
use crate::store::{short_name, HOSTNAME_LABEL_LEN, KEYWORD_LABEL_PREFIX, OBFUSCATED_DOMAIN};
use crate::{MappingStore, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::ops::Range;

// Text this substituter produced on an earlier pass.
static RE_OBFUSCATED_HOST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b[a-z0-9]{{{}}}\.{}\b",
        HOSTNAME_LABEL_LEN,
        regex::escape(OBFUSCATED_DOMAIN)
    ))
    .unwrap()
});

// Keyword labels issued earlier in the pipeline.
static RE_KEYWORD_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"{}\d+", KEYWORD_LABEL_PREFIX)).unwrap());

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

/// Replaces one host's names.
#[derive(Debug, Clone)]
pub struct HostnameSubstituter {
    fqdn: String,
    short: String,
}

impl HostnameSubstituter {
    /// Returns `None` for an empty name or one starting with a dot.
    pub fn new(hostname: &str) -> Option<Self> {
        let fqdn = hostname.trim().trim_end_matches('.');
        let short = short_name(fqdn);
        if short.is_empty() {
            return None;
        }
        Some(Self {
            fqdn: fqdn.to_string(),
            short: short.to_string(),
        })
    }

    pub fn fqdn(&self) -> &str {
        &self.fqdn
    }

    pub fn short(&self) -> &str {
        &self.short
    }

    fn dotted(&self) -> bool {
        self.fqdn.len() > self.short.len()
    }

    /// Replace both spellings of the host name in `line`.
    pub fn apply<'a>(&self, line: &'a str, store: &MappingStore) -> Result<(Cow<'a, str>, usize)> {
        // The short name is a prefix of the FQDN.
        if !line.contains(self.short.as_str()) {
            return Ok((Cow::Borrowed(line), 0));
        }

        let mut taken: Vec<Range<usize>> = RE_OBFUSCATED_HOST
            .find_iter(line)
            .map(|m| m.range())
            .collect();

        let mut found: Vec<(Range<usize>, bool)> = Vec::new();
        if self.dotted() {
            for range in bounded_matches(line, &self.fqdn, &taken) {
                taken.push(range.clone());
                found.push((range, true));
            }
        }
        // A bare short name may look like a keyword label; a full name may not.
        taken.extend(RE_KEYWORD_LABEL.find_iter(line).map(|m| m.range()));
        for range in bounded_matches(line, &self.short, &taken) {
            found.push((range, false));
        }
        if found.is_empty() {
            return Ok((Cow::Borrowed(line), 0));
        }
        found.sort_by_key(|(range, _)| range.start);

        let labels = store.host(&self.fqdn)?;
        let subs: Vec<Substitution> = found
            .into_iter()
            .map(|(range, is_fqdn)| Substitution {
                start: range.start,
                end: range.end,
                replacement: if is_fqdn {
                    labels.fqdn.clone()
                } else {
                    labels.short.clone()
                },
            })
            .collect();
        let count = subs.len();
        Ok((Cow::Owned(splice(line, &subs, WidthMode::Natural)), count))
    }
}

/// Matches of `name` not glued to other name characters and not inside
/// any `taken` range.
fn bounded_matches(line: &str, name: &str, taken: &[Range<usize>]) -> Vec<Range<usize>> {
    line.match_indices(name)
        .map(|(start, _)| start..start + name.len())
        .filter(|range| {
            let before = line[..range.start].chars().next_back();
            let after = line[range.end..].chars().next();
            !before.is_some_and(is_name_char) && !after.is_some_and(is_name_char)
        })
        .filter(|range| {
            !taken
                .iter()
                .any(|t| range.start < t.end && t.start < range.end)
        })
        .collect()
}
