//! Redaction and obfuscation engine for host collector archives.
//!
//! Everything that leaves the host passes through a [`Cleaner`], which drops
//! operator-denied lines, masks password values and replaces network
//! identifiers, the host's own name and operator keywords with synthetic
//! stand-ins.
//!
//! # Key Features
//!
//! - **Consistent**: a per-run [`MappingStore`] maps each original value to
//!   one image, so the same address reads the same in every file.
//! - **Bijective**: images come from private pools allocated sequentially
//!   and are never reused; an exhausted pool is a hard error.
//! - **Idempotent**: cleaning cleaned output with the same configuration is a
//!   no-op.
//! - **Column-preserving**: `netstat` style tables keep their alignment.
//!
//! # Example
//!
//! ```
//! use hc_redact::{CategorySet, CleanOptions, Cleaner, CleanerConfig, MappingStore};
//! use std::sync::Arc;
//!
//! let config = CleanerConfig {
//!     obfuscate: CategorySet::all(),
//!     keywords: vec!["name".into(), "day".into()],
//!     ..CleanerConfig::default()
//! };
//! let cleaner = Cleaner::new(&config, Arc::new(MappingStore::new())).unwrap();
//!
//! let line = cleaner
//!     .clean_line("radius_ip_1=10.0.0.1", &CleanOptions::default())
//!     .unwrap();
//! assert_eq!(line.as_deref(), Some("radius_ip_1=10.230.230.1"));
//! ```

pub mod canonicalize;
pub mod category;
pub mod cleaner;
pub mod error;
pub mod filter;
pub mod hostname;
pub mod keyword;
pub mod network;
pub mod password;
pub mod pool;
pub mod splice;
pub mod store;

pub use canonicalize::MacAddr;
pub use category::{Category, CategorySet};
pub use cleaner::{
    CleanOptions, CleanedText, Cleaner, CleanerConfig, LineStats, DEFAULT_MAX_LINE_LENGTH,
};
pub use error::{RedactionError, Result};
pub use filter::{DropRule, LineFilter};
pub use hostname::HostnameSubstituter;
pub use keyword::{validate_keyword, KeywordMatch, KeywordSubstituter};
pub use password::PASSWORD_MASK;
pub use pool::AddressPool;
pub use splice::WidthMode;
pub use store::{HostLabels, Mapping, MappingSnapshot, MappingStore};
