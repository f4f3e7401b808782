//! Inventory facts sidecar.

use crate::report::create_output_dir;
use crate::Result;
use hc_redact::{Category, CategorySet, Mapping, MappingStore};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Mode of the facts file, set explicitly regardless of the umask.
pub const FACTS_MODE: u32 = 0o644;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryFacts {
    pub enabled: bool,
    pub mappings: Vec<Mapping>,
}

/// Obfuscation state published alongside the host's inventory facts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactsRecord {
    pub obfuscation_enabled: bool,
    pub ipv4: CategoryFacts,
    pub ipv6: CategoryFacts,
    pub mac: CategoryFacts,
    pub hostname: CategoryFacts,
    pub keyword: CategoryFacts,
}

impl FactsRecord {
    pub fn from_store(store: &MappingStore, enabled: CategorySet) -> Self {
        let facts = |category: Category| {
            let on = enabled.contains(category);
            CategoryFacts {
                enabled: on,
                mappings: if on { store.entries(category) } else { Vec::new() },
            }
        };
        Self {
            obfuscation_enabled: !enabled.is_empty(),
            ipv4: facts(Category::Ipv4),
            ipv6: facts(Category::Ipv6),
            mac: facts(Category::Mac),
            hostname: facts(Category::Hostname),
            keyword: facts(Category::Keyword),
        }
    }

    /// Write as JSON and set mode [`FACTS_MODE`].
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_output_dir(dir)?;
        }
        fs::write(path, serde_json::to_vec(self)?)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(FACTS_MODE))?;
        }
        Ok(())
    }
}
