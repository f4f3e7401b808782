//! Keyword substitution.
//!
//! Each configured keyword is replaced by a stable `keywordN` label. Labels
//! are numbered in order of first occurrence in the cleaned content.
//!
//! Matching is substring based by default: a keyword inside a longer word is
//! still replaced (`today` with keyword `day` becomes `tokeyword1`). The
//! [`KeywordMatch::Word`] strategy restricts matches to whole words.
//!
//! Text that already reads as a label is never matched, so a keyword spanning
//! the edge of a label cannot rewrite it on a later pass. When passwords are
//! masked afterwards, password key names and values are left alone too, so a
//! keyword can never break a key apart and let its value through.

use crate::pool::IPV6_POOL_START;
use crate::password::{password_spans, PASSWORD_KEYS, PASSWORD_MASK};
use crate::store::{KEYWORD_LABEL_PREFIX, OBFUSCATED_DOMAIN};
use crate::{MappingStore, RedactionError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::ops::Range;

static RE_KEYWORD_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"{}\d+", KEYWORD_LABEL_PREFIX)).unwrap());

/// How a keyword is located in a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordMatch {
    /// Match anywhere, including inside longer words.
    #[default]
    Substring,
    /// Match only when not adjacent to other word characters.
    Word,
}

impl std::str::FromStr for KeywordMatch {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "substring" => Ok(KeywordMatch::Substring),
            "word" => Ok(KeywordMatch::Word),
            _ => Err(format!("unknown keyword match strategy: {}", s)),
        }
    }
}

/// Check that a keyword cannot re-match text the cleaner itself produces.
pub fn validate_keyword(keyword: &str) -> Result<()> {
    let reject = |reason: &str| {
        Err(RedactionError::InvalidKeyword {
            keyword: keyword.to_string(),
            reason: reason.to_string(),
        })
    };

    if keyword.trim().is_empty() {
        return reject("keyword is empty");
    }
    if keyword.contains(KEYWORD_LABEL_PREFIX) {
        return reject("keyword contains the keyword label prefix");
    }

    let stem = keyword.trim_end_matches(|c: char| c.is_ascii_digit());
    if stem.len() < keyword.len() {
        if KEYWORD_LABEL_PREFIX.ends_with(stem) {
            return reject("keyword would match keyword labels");
        }
    } else if KEYWORD_LABEL_PREFIX.contains(keyword) {
        return reject("keyword would match keyword labels");
    }

    if PASSWORD_KEYS.iter().any(|key| key.contains(&keyword.to_lowercase())) {
        return reject("keyword would hide password keys");
    }

    let domain = format!(".{}", OBFUSCATED_DOMAIN);
    if domain.contains(keyword) || keyword.contains(&domain) {
        return reject("keyword would match obfuscated hostnames");
    }
    if keyword.chars().any(|c| PASSWORD_MASK.contains(c)) {
        return reject("keyword would match masked passwords");
    }
    if IPV6_POOL_START.to_string().contains(keyword) {
        return reject("keyword would match obfuscated IPv6 addresses");
    }
    if keyword
        .chars()
        .all(|c| c.is_ascii_hexdigit() || matches!(c, '.' | ':' | '-'))
    {
        return reject("keyword would match obfuscated network addresses");
    }

    Ok(())
}

/// Replaces configured keywords with their store labels.
#[derive(Debug, Clone, Default)]
pub struct KeywordSubstituter {
    keywords: Vec<String>,
    strategy: KeywordMatch,
}

impl KeywordSubstituter {
    /// Validate and de-duplicate keywords, keeping configuration order.
    pub fn new(keywords: &[String], strategy: KeywordMatch) -> Result<Self> {
        let mut unique: Vec<String> = Vec::with_capacity(keywords.len());
        for keyword in keywords {
            validate_keyword(keyword)?;
            if !unique.contains(keyword) {
                unique.push(keyword.clone());
            }
        }
        Ok(Self {
            keywords: unique,
            strategy,
        })
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Replace every keyword in `line`. With `guard_passwords`, matches
    /// touching a password key name or value are skipped.
    ///
    /// Returns the line and the number of replacements made.
    pub fn apply<'a>(
        &self,
        line: &'a str,
        store: &MappingStore,
        guard_passwords: bool,
    ) -> (Cow<'a, str>, usize) {
        // Number new keywords by where they first appear in this line.
        let mut first_seen: Vec<(usize, usize)> = self
            .keywords
            .iter()
            .enumerate()
            .filter_map(|(idx, kw)| {
                find_matches(line, kw, self.strategy, guard_passwords)
                    .first()
                    .map(|pos| (*pos, idx))
            })
            .collect();
        if first_seen.is_empty() {
            return (Cow::Borrowed(line), 0);
        }
        first_seen.sort_unstable();

        let labels: Vec<(usize, String)> = first_seen
            .iter()
            .map(|(_, idx)| (*idx, store.keyword(&self.keywords[*idx])))
            .collect();

        let mut current = line.to_string();
        let mut count = 0;
        for (idx, keyword) in self.keywords.iter().enumerate() {
            let Some((_, label)) = labels.iter().find(|(i, _)| *i == idx) else {
                continue;
            };
            let positions = find_matches(&current, keyword, self.strategy, guard_passwords);
            if positions.is_empty() {
                continue;
            }
            count += positions.len();
            current = replace_at(&current, &positions, keyword.len(), label);
        }
        (Cow::Owned(current), count)
    }
}

/// Start offsets of non-overlapping matches, left to right, skipping any
/// that touch an existing label (or a password key or value when guarded).
fn find_matches(
    haystack: &str,
    keyword: &str,
    strategy: KeywordMatch,
    guard_passwords: bool,
) -> Vec<usize> {
    if !haystack.contains(keyword) {
        return Vec::new();
    }
    let mut labels: Vec<Range<usize>> = RE_KEYWORD_LABEL
        .find_iter(haystack)
        .map(|m| m.range())
        .collect();
    if guard_passwords {
        labels.extend(password_spans(haystack));
    }
    haystack
        .match_indices(keyword)
        .map(|(pos, _)| pos)
        .filter(|pos| {
            let end = *pos + keyword.len();
            !labels.iter().any(|l| *pos < l.end && l.start < end)
        })
        .filter(|pos| match strategy {
            KeywordMatch::Substring => true,
            KeywordMatch::Word => is_word_bounded(haystack, *pos, *pos + keyword.len()),
        })
        .collect()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_word_bounded(haystack: &str, start: usize, end: usize) -> bool {
    let inner_first = haystack[start..end].chars().next();
    let inner_last = haystack[start..end].chars().next_back();
    let before = haystack[..start].chars().next_back();
    let after = haystack[end..].chars().next();

    let left_ok = !(inner_first.is_some_and(is_word_char) && before.is_some_and(is_word_char));
    let right_ok = !(inner_last.is_some_and(is_word_char) && after.is_some_and(is_word_char));
    left_ok && right_ok
}

fn replace_at(haystack: &str, positions: &[usize], len: usize, replacement: &str) -> String {
    let mut out = String::with_capacity(haystack.len() + positions.len() * replacement.len());
    let mut last = 0;
    for &pos in positions {
        out.push_str(&haystack[last..pos]);
        out.push_str(replacement);
        last = pos + len;
    }
    out.push_str(&haystack[last..]);
    out
}
