//! Log level and format, from `HC_LOG`/`HC_LOG_FORMAT` with CLI overrides.

use tracing_subscriber::filter::LevelFilter;

/// Shape of the events written to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Human,
    /// One JSON object per event.
    Jsonl,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "human" => Ok(LogFormat::Human),
            "jsonl" | "json" => Ok(LogFormat::Jsonl),
            _ => Err(format!("unknown log format: {s} (expected human or jsonl)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LevelFilter,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            level: LevelFilter::INFO,
        }
    }
}

impl LogConfig {
    /// Read the environment, then apply whatever the command line set.
    pub fn from_env(cli_level: Option<LevelFilter>, cli_format: Option<LogFormat>) -> Self {
        Self::from_vars(
            std::env::var("HC_LOG").ok().as_deref(),
            std::env::var("HC_LOG_FORMAT").ok().as_deref(),
            cli_level,
            cli_format,
        )
    }

    /// Unparseable variables are ignored rather than failing startup.
    fn from_vars(
        hc_log: Option<&str>,
        hc_log_format: Option<&str>,
        cli_level: Option<LevelFilter>,
        cli_format: Option<LogFormat>,
    ) -> Self {
        let defaults = LogConfig::default();
        let level = cli_level
            .or_else(|| hc_log.and_then(|v| v.parse().ok()))
            .unwrap_or(defaults.level);
        let format = cli_format
            .or_else(|| hc_log_format.and_then(|v| v.parse().ok()))
            .unwrap_or(defaults.format);
        LogConfig { format, level }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!("human".parse::<LogFormat>().unwrap(), LogFormat::Human);
        assert_eq!("JSONL".parse::<LogFormat>().unwrap(), LogFormat::Jsonl);
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Jsonl);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_env_then_cli_precedence() {
        let config = LogConfig::from_vars(Some("debug"), Some("json"), None, None);
        assert_eq!(config.level, LevelFilter::DEBUG);
        assert_eq!(config.format, LogFormat::Jsonl);

        let config = LogConfig::from_vars(
            Some("debug"),
            Some("json"),
            Some(LevelFilter::ERROR),
            Some(LogFormat::Human),
        );
        assert_eq!(config.level, LevelFilter::ERROR);
        assert_eq!(config.format, LogFormat::Human);

        let config = LogConfig::from_vars(Some("off"), None, None, None);
        assert_eq!(config.level, LevelFilter::OFF);

        let config = LogConfig::from_vars(Some("loud"), Some("xml"), None, None);
        assert_eq!(config, LogConfig::default());
    }
}
