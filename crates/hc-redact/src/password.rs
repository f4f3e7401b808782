//! Password value masking.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::ops::Range;

/// Replacement for every masked value.
pub const PASSWORD_MASK: &str = "********";

// [prefix]key[suffix] <ws> (:|=) <ws> value
// value: "double quoted" | 'single quoted' | bare token
static RE_PASSWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\b([a-z0-9_]*(?:password|passwd|rootpw)[a-z0-9_]*)(\s*[:=]\s*)(?:"([^"]*)"|'([^']*)'|([^\s"',;]+))"#,
    )
    .unwrap()
});

static RE_PASSWORD_STEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)password|passwd|rootpw").unwrap());

/// Key names whose values are masked.
pub const PASSWORD_KEYS: [&str; 3] = ["password", "passwd", "rootpw"];

/// Spans that must survive earlier stages for a value to stay maskable: each
/// key name stem, and everything from the delimiter to the end of the value.
pub(crate) fn password_spans(line: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    for caps in RE_PASSWORD.captures_iter(line) {
        let (Some(key), Some(delim), Some(whole)) = (caps.get(1), caps.get(2), caps.get(0)) else {
            continue;
        };
        spans.extend(
            RE_PASSWORD_STEM
                .find_iter(key.as_str())
                .map(|m| key.start() + m.start()..key.start() + m.end()),
        );
        spans.push(delim.start()..whole.end());
    }
    spans
}

/// Mask password values in a line.
///
/// Returns the (possibly borrowed) line and the number of values masked.
pub fn mask_passwords(line: &str) -> (Cow<'_, str>, usize) {
    let mut count = 0;
    let out = RE_PASSWORD.replace_all(line, |caps: &Captures<'_>| {
        count += 1;
        let value = if caps.get(3).is_some() {
            format!("\"{}\"", PASSWORD_MASK)
        } else if caps.get(4).is_some() {
            format!("'{}'", PASSWORD_MASK)
        } else {
            PASSWORD_MASK.to_string()
        };
        format!("{}{}{}", &caps[1], &caps[2], value)
    });
    (out, count)
}
