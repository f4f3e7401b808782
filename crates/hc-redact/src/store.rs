//! Per-run mapping store.
//!
//! Holds one insertion-ordered table per [`Category`] mapping a canonical
//! original value to its obfuscated image. The store is created for a single
//! collection run and shared (behind an `Arc`) by every component that needs
//! it; nothing is persisted.
//!
//! Lookups of known keys only take the read lock. Allocation takes the write
//! lock and re-checks the table, so concurrent callers can never allocate two
//! images for one key or hand one image to two keys.

use crate::canonicalize::MacAddr;
use crate::pool::AddressPool;
use crate::{Category, RedactionError, Result};
use indexmap::IndexMap;
use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Fake domain appended to obfuscated fully-qualified hostnames.
pub const OBFUSCATED_DOMAIN: &str = "example.com";

/// Length of the random hostname label.
pub const HOSTNAME_LABEL_LEN: usize = 12;

/// Prefix of keyword labels (`keyword0`, `keyword1`, ...).
pub const KEYWORD_LABEL_PREFIX: &str = "keyword";

const LABEL_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Attempts at drawing an acceptable hostname label before giving up.
const MAX_LABEL_ATTEMPTS: usize = 10_000;

/// One original → obfuscated correspondence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    pub original: String,
    pub obfuscated: String,
}

/// Obfuscated spellings of the host's own name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostLabels {
    /// Image of the fully-qualified name (`<label>.example.com`).
    pub fqdn: String,
    /// Image of the short name (`<label>`).
    pub short: String,
}

/// Serializable copy of every table, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingSnapshot {
    pub ipv4: Vec<Mapping>,
    pub ipv6: Vec<Mapping>,
    pub mac: Vec<Mapping>,
    pub hostname: Vec<Mapping>,
    pub keyword: Vec<Mapping>,
}

impl MappingSnapshot {
    pub fn get(&self, category: Category) -> &[Mapping] {
        match category {
            Category::Ipv4 => &self.ipv4,
            Category::Ipv6 => &self.ipv6,
            Category::Mac => &self.mac,
            Category::Hostname => &self.hostname,
            Category::Keyword => &self.keyword,
        }
    }
}

#[derive(Debug, Default)]
struct Table {
    forward: IndexMap<String, String>,
    images: HashSet<String>,
}

impl Table {
    fn insert(&mut self, original: String, image: String) {
        self.images.insert(image.clone());
        self.forward.insert(original, image);
    }
}

struct StoreInner {
    tables: [Table; 5],
    ipv4: AddressPool,
    ipv6: AddressPool,
    mac: AddressPool,
    rng: StdRng,
    /// Substrings a hostname label must never contain.
    excluded: Vec<String>,
}

impl StoreInner {
    fn table(&self, category: Category) -> &Table {
        &self.tables[category as usize]
    }

    fn table_mut(&mut self, category: Category) -> &mut Table {
        &mut self.tables[category as usize]
    }

    /// A random label not yet issued and free of excluded substrings.
    fn fresh_label(&mut self) -> Result<String> {
        for _ in 0..MAX_LABEL_ATTEMPTS {
            let label: String = (0..HOSTNAME_LABEL_LEN)
                .map(|_| LABEL_CHARSET[self.rng.random_range(0..LABEL_CHARSET.len())] as char)
                .collect();
            if self.excluded.iter().any(|word| label.contains(word.as_str())) {
                continue;
            }
            let fqdn = format!("{}.{}", label, OBFUSCATED_DOMAIN);
            let images = &self.table(Category::Hostname).images;
            if !images.contains(&label) && !images.contains(&fqdn) {
                return Ok(label);
            }
        }
        Err(RedactionError::PoolExhausted {
            category: Category::Hostname,
        })
    }
}

/// The per-run original → obfuscated tables.
pub struct MappingStore {
    inner: RwLock<StoreInner>,
}

impl MappingStore {
    /// Create an empty store with labels drawn from OS entropy.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Create an empty store with reproducible hostname labels.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                tables: Default::default(),
                ipv4: AddressPool::ipv4(),
                ipv6: AddressPool::ipv6(),
                mac: AddressPool::mac(),
                rng,
                excluded: Vec::new(),
            }),
        }
    }

    /// Replace the pool used for a network category (tests of exhaustion).
    pub fn set_pool(&self, pool_for: Category, pool: AddressPool) {
        let mut inner = self.inner.write();
        match pool_for {
            Category::Ipv4 => inner.ipv4 = pool,
            Category::Ipv6 => inner.ipv6 = pool,
            Category::Mac => inner.mac = pool,
            Category::Hostname | Category::Keyword => {}
        }
    }

    /// Never generate hostname labels containing any of `words`.
    ///
    /// Keyword matching runs before hostname substitution, so a label holding
    /// a keyword would be rewritten when a cleaned archive is cleaned again.
    pub fn exclude_from_labels(&self, words: &[String]) {
        let mut inner = self.inner.write();
        for word in words {
            let word = word.to_string();
            if !word.is_empty() && !inner.excluded.contains(&word) {
                inner.excluded.push(word);
            }
        }
    }

    fn resolve<F>(&self, category: Category, key: &str, allocate: F) -> Result<String>
    where
        F: FnOnce(&mut StoreInner) -> Result<String>,
    {
        if let Some(image) = self.inner.read().table(category).forward.get(key) {
            return Ok(image.clone());
        }

        let mut inner = self.inner.write();
        if let Some(image) = inner.table(category).forward.get(key) {
            return Ok(image.clone());
        }
        let image = allocate(&mut inner)?;
        inner
            .table_mut(category)
            .insert(key.to_string(), image.clone());
        Ok(image)
    }

    /// Image of an IPv4 address, allocating on first sight.
    pub fn ipv4(&self, addr: Ipv4Addr) -> Result<String> {
        self.resolve(Category::Ipv4, &addr.to_string(), |inner| {
            let next = inner.ipv4.allocate()?;
            Ok(Ipv4Addr::from(next as u32).to_string())
        })
    }

    /// Image of an IPv6 address, allocating on first sight.
    pub fn ipv6(&self, addr: Ipv6Addr) -> Result<String> {
        self.resolve(Category::Ipv6, &addr.to_string(), |inner| {
            let next = inner.ipv6.allocate()?;
            Ok(Ipv6Addr::from(next).to_string())
        })
    }

    /// Canonical image of a MAC address, allocating on first sight.
    pub fn mac(&self, addr: MacAddr) -> Result<String> {
        self.resolve(Category::Mac, &addr.to_string(), |inner| {
            let next = inner.mac.allocate()?;
            Ok(MacAddr::from_u64(next as u64).to_string())
        })
    }

    /// Label for a keyword: `keywordN`, N counting distinct keywords seen.
    pub fn keyword(&self, keyword: &str) -> String {
        let label = self.resolve(Category::Keyword, keyword, |inner| {
            let n = inner.table(Category::Keyword).forward.len();
            Ok(format!("{}{}", KEYWORD_LABEL_PREFIX, n))
        });
        // Keyword allocation has no failure path.
        label.unwrap_or_else(|_| KEYWORD_LABEL_PREFIX.to_string())
    }

    /// Register the host's name and return the images of both spellings.
    ///
    /// The FQDN and its short form share one random label so the two stay
    /// recognisably related in the cleaned archive.
    pub fn host(&self, fqdn: &str) -> Result<HostLabels> {
        let short = short_name(fqdn);
        let dotted = fqdn.contains('.');

        {
            let inner = self.inner.read();
            if let Some(labels) = known_host(inner.table(Category::Hostname), fqdn, short, dotted) {
                return Ok(labels);
            }
        }

        let mut inner = self.inner.write();
        if let Some(labels) = known_host(inner.table(Category::Hostname), fqdn, short, dotted) {
            return Ok(labels);
        }

        let label = inner.fresh_label()?;
        let labels = HostLabels {
            fqdn: if dotted {
                format!("{}.{}", label, OBFUSCATED_DOMAIN)
            } else {
                label.clone()
            },
            short: label,
        };
        let table = inner.table_mut(Category::Hostname);
        table.insert(fqdn.to_string(), labels.fqdn.clone());
        if dotted {
            table.insert(short.to_string(), labels.short.clone());
        }
        Ok(labels)
    }

    /// Existing image for a canonical original value.
    pub fn lookup(&self, category: Category, original: &str) -> Option<String> {
        self.inner.read().table(category).forward.get(original).cloned()
    }

    /// All mappings of a category in insertion order.
    pub fn entries(&self, category: Category) -> Vec<Mapping> {
        self.inner
            .read()
            .table(category)
            .forward
            .iter()
            .map(|(original, obfuscated)| Mapping {
                original: original.clone(),
                obfuscated: obfuscated.clone(),
            })
            .collect()
    }

    pub fn len(&self, category: Category) -> usize {
        self.inner.read().table(category).forward.len()
    }

    pub fn is_empty(&self, category: Category) -> bool {
        self.len(category) == 0
    }

    /// Copy of every table.
    pub fn snapshot(&self) -> MappingSnapshot {
        MappingSnapshot {
            ipv4: self.entries(Category::Ipv4),
            ipv6: self.entries(Category::Ipv6),
            mac: self.entries(Category::Mac),
            hostname: self.entries(Category::Hostname),
            keyword: self.entries(Category::Keyword),
        }
    }
}

impl Default for MappingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MappingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        let mut dbg = f.debug_struct("MappingStore");
        for category in Category::ALL {
            dbg.field(
                &category.to_string(),
                &inner.table(category).forward.len(),
            );
        }
        dbg.finish()
    }
}

/// First label of a dotted name.
pub fn short_name(fqdn: &str) -> &str {
    fqdn.split('.').next().unwrap_or(fqdn)
}

fn known_host(table: &Table, fqdn: &str, short: &str, dotted: bool) -> Option<HostLabels> {
    let fqdn_image = table.forward.get(fqdn)?;
    if !dotted {
        return Some(HostLabels {
            fqdn: fqdn_image.clone(),
            short: fqdn_image.clone(),
        });
    }
    let short_image = table.forward.get(short)?;
    Some(HostLabels {
        fqdn: fqdn_image.clone(),
        short: short_image.clone(),
    })
}
