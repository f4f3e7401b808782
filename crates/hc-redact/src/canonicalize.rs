//! Canonicalization of identifiers before mapping lookups.
//!
//! Two spellings of the same address must land on the same store key, so
//! network identifiers are parsed to their numeric form first.

use std::net::{Ipv4Addr, Ipv6Addr};

/// Parse an IPv4 address in dotted-quad form.
pub fn canonical_ipv4(value: &str) -> Option<Ipv4Addr> {
    value.parse().ok()
}

/// Parse an IPv6 address in any textual form (full, compressed, embedded IPv4).
pub fn canonical_ipv6(value: &str) -> Option<Ipv6Addr> {
    value.parse().ok()
}

/// A 48-bit hardware address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    /// Parse six hex octets separated by a consistent `:` or `-`.
    pub fn parse(value: &str) -> Option<Self> {
        let sep = value.chars().nth(2)?;
        if sep != ':' && sep != '-' {
            return None;
        }

        let mut octets = [0u8; 6];
        let mut count = 0;
        for part in value.split(sep) {
            if count == 6 || part.len() != 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return None;
            }
            octets[count] = u8::from_str_radix(part, 16).ok()?;
            count += 1;
        }

        (count == 6).then_some(MacAddr(octets))
    }

    pub fn from_u64(value: u64) -> Self {
        let bytes = value.to_be_bytes();
        let mut octets = [0u8; 6];
        octets.copy_from_slice(&bytes[2..]);
        MacAddr(octets)
    }

    pub fn to_u64(self) -> u64 {
        let mut bytes = [0u8; 8];
        bytes[2..].copy_from_slice(&self.0);
        u64::from_be_bytes(bytes)
    }
}

impl std::fmt::Display for MacAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}", a, b, c, d, e, g)
    }
}

/// Rewrite a canonical MAC (`aa:bb:..`) with the separator and letter case of
/// the `original` spelling it replaces.
pub fn restyle_mac(canonical: &str, original: &str) -> String {
    let sep = if original.contains('-') { '-' } else { ':' };
    let upper = original.chars().any(|c| c.is_ascii_uppercase());
    canonical
        .chars()
        .map(|c| match c {
            ':' => sep,
            c if upper => c.to_ascii_uppercase(),
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv6_spellings_share_key() {
        let short = canonical_ipv6("FE80::1").unwrap();
        let long = canonical_ipv6("fe80:0000:0000:0000:0000:0000:0000:0001").unwrap();
        let mixed = canonical_ipv6("fe80:0:0:0:0:0:0:1").unwrap();
        assert_eq!(short, long);
        assert_eq!(short, mixed);
        assert_eq!(short.to_string(), "fe80::1");
    }

    #[test]
    fn test_ipv4_rejects_garbage() {
        assert_eq!(canonical_ipv4("10.0.0.1"), Some(Ipv4Addr::new(10, 0, 0, 1)));
        assert!(canonical_ipv4("10.0.0.256").is_none());
        assert!(canonical_ipv4("10.0.0").is_none());
    }

    #[test]
    fn test_mac_parse_and_canonical_form() {
        let colon = MacAddr::parse("52:54:00:AB:cd:EF").unwrap();
        let dash = MacAddr::parse("52-54-00-ab-cd-ef").unwrap();
        assert_eq!(colon, dash);
        assert_eq!(colon.to_string(), "52:54:00:ab:cd:ef");
    }

    #[test]
    fn test_mac_rejects_mixed_separators() {
        assert!(MacAddr::parse("52:54-00:ab:cd:ef").is_none());
        assert!(MacAddr::parse("52:54:00:ab:cd").is_none());
        assert!(MacAddr::parse("52:54:00:ab:cd:ef:01").is_none());
        assert!(MacAddr::parse("52:54:00:ab:cd:eg").is_none());
    }

    #[test]
    fn test_restyle_mac() {
        let canonical = MacAddr([0x02, 0, 0, 0, 0, 0x0a]).to_string();
        assert_eq!(restyle_mac(&canonical, "52-54-00-AB-CD-EF"), "02-00-00-00-00-0A");
        assert_eq!(restyle_mac(&canonical, "52:54:00:ab:cd:ef"), "02:00:00:00:00:0a");
    }

    #[test]
    fn test_mac_u64_roundtrip() {
        let mac = MacAddr([0x02, 0x11, 0x22, 0x33, 0x44, 0x55]);
        assert_eq!(MacAddr::from_u64(mac.to_u64()), mac);
    }
}
