//! Host name resolution.
//!
//! The cleaner needs the host's fully-qualified name once per run. An
//! explicit override wins; otherwise the kernel host name is used, and a bare
//! short name is expanded through `/etc/hosts` when an alias line lists a
//! dotted name for it.

use std::ffi::CStr;
use std::fs;
use std::path::Path;
use tracing::debug;

const HOSTS_FILE: &str = "/etc/hosts";

/// Resolve the host's FQDN. Returns `None` only when no name is available.
pub fn resolve_fqdn(override_name: Option<&str>) -> Option<String> {
    if let Some(name) = override_name.map(str::trim).filter(|n| !n.is_empty()) {
        debug!(source = "override", "host name resolved");
        return Some(name.to_string());
    }

    let name = kernel_hostname()?;
    if name.contains('.') {
        debug!(source = "gethostname", "host name resolved");
        return Some(name);
    }

    let expanded = fs::read_to_string(Path::new(HOSTS_FILE))
        .ok()
        .and_then(|hosts| fqdn_from_hosts(&name, &hosts));
    debug!(
        source = if expanded.is_some() { "hosts" } else { "gethostname" },
        "host name resolved"
    );
    Some(expanded.unwrap_or(name))
}

/// `gethostname(2)`.
fn kernel_hostname() -> Option<String> {
    let mut buf = [0u8; 256];
    // SAFETY: buf is valid for buf.len() bytes; the last byte stays NUL.
    let rc = unsafe { libc::gethostname(buf.as_mut_ptr().cast(), buf.len() - 1) };
    if rc != 0 {
        return None;
    }
    let name = CStr::from_bytes_until_nul(&buf).ok()?.to_string_lossy();
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Find a dotted name for `short` on a `/etc/hosts` line that also lists it.
pub fn fqdn_from_hosts(short: &str, hosts: &str) -> Option<String> {
    let prefix = format!("{}.", short);
    hosts
        .lines()
        .map(|line| line.split('#').next().unwrap_or(""))
        .filter_map(|line| {
            let names: Vec<&str> = line.split_whitespace().skip(1).collect();
            if !names.iter().any(|n| *n == short || n.starts_with(&prefix)) {
                return None;
            }
            names
                .iter()
                .find(|n| n.starts_with(&prefix) && n.len() > prefix.len())
                .map(|n| n.trim_end_matches('.').to_string())
        })
        .next()
}
