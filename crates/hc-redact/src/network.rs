//! IPv4, IPv6 and MAC address substitution.
//!
//! Every matcher locates candidates on the original line, rejects the ones
//! that are part of a larger token (version strings, digests, build IDs) and
//! hands the survivors to [`splice`] together with their store images.

use crate::canonicalize::{restyle_mac, MacAddr};
use crate::splice::{splice, Substitution, WidthMode};
use crate::{MappingStore, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::net::{Ipv4Addr, Ipv6Addr};

// Octets without leading zeros, most specific alternative first.
static RE_IPV4: Lazy<Regex> = Lazy::new(|| {
    let octet = r"(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)";
    Regex::new(&format!(r"{octet}(?:\.{octet}){{3}}")).unwrap()
});

// Maximal runs of IPv6 characters; validated with `Ipv6Addr::from_str`.
static RE_IPV6_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9A-Fa-f:.]{2,}").unwrap());

static RE_MAC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:[0-9A-Fa-f]{2}:){5}[0-9A-Fa-f]{2}|(?:[0-9A-Fa-f]{2}-){5}[0-9A-Fa-f]{2}")
        .unwrap()
});

// A `version` key immediately before the value: "version": "4.1.5.1",
// os_version=1.2.3.4, VERSION: 10.0.0.1
static RE_VERSION_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)version[\w-]*"?\s*[:=]\s*"?$"#).unwrap());

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn char_before(line: &str, pos: usize) -> Option<char> {
    line[..pos].chars().next_back()
}

fn char_after(line: &str, pos: usize) -> Option<char> {
    line[pos..].chars().next()
}

fn ipv4_is_standalone(line: &str, start: usize, end: usize) -> bool {
    if char_before(line, start).is_some_and(|c| is_word_char(c) || c == '.' || c == '-') {
        return false;
    }
    let mut after = line[end..].chars();
    match after.next() {
        Some(c) if is_word_char(c) => return false,
        // 1.2.3.4.5 is a version, 1.2.3.4. ends a sentence
        Some('.') if after.next().is_some_and(|c| c.is_ascii_digit()) => return false,
        _ => {}
    }
    !RE_VERSION_KEY.is_match(&line[..start])
}

fn mac_is_standalone(line: &str, start: usize, end: usize) -> bool {
    if char_before(line, start)
        .is_some_and(|c| is_word_char(c) || matches!(c, ':' | '-' | '.'))
    {
        return false;
    }
    let mut after = line[end..].chars();
    match after.next() {
        Some(c) if is_word_char(c) => false,
        Some(':' | '-' | '.') => !after.next().is_some_and(|c| c.is_ascii_hexdigit()),
        _ => true,
    }
}

/// Narrow an IPv6 run to a parseable address, if it holds one.
fn ipv6_candidate(line: &str, start: usize, end: usize) -> Option<(usize, usize, Ipv6Addr)> {
    let run = &line[start..end];
    if run.matches(':').count() < 2 || !run.chars().any(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let mut s = start;
    let mut e = end;
    // `port:fe80::1` or a sentence-ending `fe80::1.`
    if run.starts_with(':') && !run.starts_with("::") {
        s += 1;
    }
    while e > s && line[s..e].ends_with('.') {
        e -= 1;
    }
    if line[s..e].ends_with(':') && !line[s..e].ends_with("::") {
        e -= 1;
    }

    if char_before(line, s).is_some_and(is_word_char) || char_after(line, e).is_some_and(is_word_char)
    {
        return None;
    }
    let addr: Ipv6Addr = line[s..e].parse().ok()?;
    Some((s, e, addr))
}

fn finish<'a>(
    line: &'a str,
    subs: Vec<Substitution>,
    mode: WidthMode,
) -> (Cow<'a, str>, usize) {
    if subs.is_empty() {
        return (Cow::Borrowed(line), 0);
    }
    let count = subs.len();
    (Cow::Owned(splice(line, &subs, mode)), count)
}

/// Replace standalone IPv4 addresses.
pub fn substitute_ipv4<'a>(
    line: &'a str,
    store: &MappingStore,
    mode: WidthMode,
) -> Result<(Cow<'a, str>, usize)> {
    let mut subs = Vec::new();
    for m in RE_IPV4.find_iter(line) {
        if !ipv4_is_standalone(line, m.start(), m.end()) {
            continue;
        }
        let Ok(addr) = m.as_str().parse::<Ipv4Addr>() else {
            continue;
        };
        subs.push(Substitution {
            start: m.start(),
            end: m.end(),
            replacement: store.ipv4(addr)?,
        });
    }
    Ok(finish(line, subs, mode))
}

/// Replace IPv6 addresses in any textual form.
pub fn substitute_ipv6<'a>(
    line: &'a str,
    store: &MappingStore,
    mode: WidthMode,
) -> Result<(Cow<'a, str>, usize)> {
    if !line.contains(':') {
        return Ok((Cow::Borrowed(line), 0));
    }
    let mut subs = Vec::new();
    for m in RE_IPV6_RUN.find_iter(line) {
        let Some((start, end, addr)) = ipv6_candidate(line, m.start(), m.end()) else {
            continue;
        };
        subs.push(Substitution {
            start,
            end,
            replacement: store.ipv6(addr)?,
        });
    }
    Ok(finish(line, subs, mode))
}

/// Replace MAC addresses, keeping the original separator and letter case.
pub fn substitute_mac<'a>(
    line: &'a str,
    store: &MappingStore,
    mode: WidthMode,
) -> Result<(Cow<'a, str>, usize)> {
    let mut subs = Vec::new();
    for m in RE_MAC.find_iter(line) {
        if !mac_is_standalone(line, m.start(), m.end()) {
            continue;
        }
        let Some(addr) = MacAddr::parse(m.as_str()) else {
            continue;
        };
        let image = store.mac(addr)?;
        subs.push(Substitution {
            start: m.start(),
            end: m.end(),
            replacement: restyle_mac(&image, m.as_str()),
        });
    }
    Ok(finish(line, subs, mode))
}
