//! Host collector configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for collector settings and redaction rules
//! - Config resolution (CLI → env → XDG → /etc → defaults)
//! - Semantic validation of every pattern, keyword and glob
//! - Config snapshots for the redaction report

pub mod collector;
pub mod document;
pub mod load;
pub mod redaction;
pub mod resolve;
pub mod snapshot;
pub mod validate;

pub use collector::CollectorConfig;
pub use load::LoadedConfig;
pub use redaction::{PatternList, RedactionConfig};
pub use resolve::{resolve_config, ConfigPaths, ConfigSource};
pub use snapshot::ConfigSnapshot;
pub use validate::{ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
