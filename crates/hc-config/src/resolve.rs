//! Locate the collector and redaction files.
//!
//! Each file is looked up independently: an explicit path, then its own
//! environment variable, then `HOST_COLLECTOR_CONFIG_DIR`, the user config
//! directory and `/etc/host-collector`. Nothing found means built-in defaults.

use std::env;
use std::path::{Path, PathBuf};

pub const ENV_COLLECTOR_PATH: &str = "HOST_COLLECTOR_CONFIG";
pub const ENV_REDACTION_PATH: &str = "HOST_COLLECTOR_REDACTION";
pub const ENV_CONFIG_DIR: &str = "HOST_COLLECTOR_CONFIG_DIR";

/// Directory name under the user and system config roots.
pub const APP_NAME: &str = "host-collector";

/// Where each file came from. Missing files leave the path `None` and the
/// source at [`ConfigSource::BuiltinDefault`].
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    pub collector: Option<PathBuf>,
    pub redaction: Option<PathBuf>,
    pub collector_source: ConfigSource,
    pub redaction_source: ConfigSource,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfigSource {
    CliArgument,
    /// A direct path variable or the config dir variable.
    Environment,
    XdgConfig,
    SystemConfig,
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ConfigSource::CliArgument => "CLI argument",
            ConfigSource::Environment => "environment variable",
            ConfigSource::XdgConfig => "XDG config",
            ConfigSource::SystemConfig => "system config",
            ConfigSource::BuiltinDefault => "builtin default",
        };
        f.write_str(label)
    }
}

/// The two files the collector reads.
#[derive(Debug, Clone, Copy)]
enum ConfigFile {
    Collector,
    Redaction,
}

impl ConfigFile {
    fn env_var(self) -> &'static str {
        match self {
            ConfigFile::Collector => ENV_COLLECTOR_PATH,
            ConfigFile::Redaction => ENV_REDACTION_PATH,
        }
    }

    /// Accepted names inside a config directory, YAML first.
    fn file_names(self) -> &'static [&'static str] {
        match self {
            ConfigFile::Collector => &["collector.yaml", "collector.yml", "collector.json"],
            ConfigFile::Redaction => &["redaction.yaml", "redaction.yml", "redaction.json"],
        }
    }

    fn locate(self, explicit: Option<&Path>) -> (Option<PathBuf>, ConfigSource) {
        if let Some(path) = explicit.filter(|p| p.exists()) {
            return (Some(path.to_path_buf()), ConfigSource::CliArgument);
        }

        let from_env = env::var_os(self.env_var())
            .map(PathBuf::from)
            .filter(|p| p.exists())
            .or_else(|| {
                env::var_os(ENV_CONFIG_DIR).and_then(|dir| self.find_in(Path::new(&dir)))
            });
        if from_env.is_some() {
            return (from_env, ConfigSource::Environment);
        }

        if let Some(path) = xdg_config_dir().and_then(|dir| self.find_in(&dir)) {
            return (Some(path), ConfigSource::XdgConfig);
        }
        if let Some(path) = self.find_in(&system_config_dir()) {
            return (Some(path), ConfigSource::SystemConfig);
        }
        (None, ConfigSource::BuiltinDefault)
    }

    fn find_in(self, dir: &Path) -> Option<PathBuf> {
        self.file_names()
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }
}

/// Resolve both files. An explicit path that does not exist is skipped
/// here; [`crate::LoadedConfig::load`] rejects it before resolving.
pub fn resolve_config(cli_collector: Option<&Path>, cli_redaction: Option<&Path>) -> ConfigPaths {
    let (collector, collector_source) = ConfigFile::Collector.locate(cli_collector);
    let (redaction, redaction_source) = ConfigFile::Redaction.locate(cli_redaction);
    ConfigPaths {
        collector,
        redaction,
        collector_source,
        redaction_source,
    }
}

/// `$XDG_CONFIG_HOME/host-collector`, or the platform equivalent.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

pub fn system_config_dir() -> PathBuf {
    Path::new("/etc").join(APP_NAME)
}
