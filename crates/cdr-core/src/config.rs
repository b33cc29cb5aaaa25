//! Application configuration
//!
//! This module provides centralized configuration management using the `config` crate.
//! Configuration can be loaded from environment variables and config files.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub feed: FeedConfig,
    pub processing: ProcessingConfig,
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub alerts: AlertConfig,
}

/// Input feed configuration
#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    /// Directory the daily CDR files are synced into
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,

    /// File name pattern; `{date}` is replaced with `YYYYMMDD`
    #[serde(default = "default_file_pattern")]
    pub file_pattern: String,

    /// Field delimiter
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Where processed files are moved (None = leave in place)
    #[serde(default)]
    pub archive_dir: Option<PathBuf>,
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("./incoming")
}

fn default_file_pattern() -> String {
    "cdr_{date}.csv".to_string()
}

fn default_delimiter() -> char {
    ';'
}

/// Batch processing configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ProcessingConfig {
    /// IANA zone of the switch that produced the CDRs
    #[serde(default = "default_source_timezone")]
    pub source_timezone: String,

    /// Logging verbosity for the batch loop
    #[serde(default)]
    pub verbosity: Verbosity,

    /// Minimum number of invalid phone values that raises an alert
    #[serde(default = "default_alert_min_threshold")]
    pub alert_min_threshold: usize,

    /// Fraction of the batch size that raises an alert
    #[serde(default = "default_alert_ratio")]
    pub alert_ratio: f64,
}

fn default_source_timezone() -> String {
    "America/Los_Angeles".to_string()
}

fn default_alert_min_threshold() -> usize {
    5
}

fn default_alert_ratio() -> f64 {
    0.10
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            source_timezone: default_source_timezone(),
            verbosity: Verbosity::default(),
            alert_min_threshold: default_alert_min_threshold(),
            alert_ratio: default_alert_ratio(),
        }
    }
}

/// Database configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

/// JSON output configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct OutputConfig {
    /// Directory for `<batch>.jsonl` files
    #[serde(default)]
    pub json_dir: Option<PathBuf>,
}

/// Alert delivery configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AlertConfig {
    /// Directory alert payloads are written into (None = log only)
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

/// How much the batch loop logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Batch summary only
    Quiet,
    /// Summary plus dropped rows and quality warnings
    #[default]
    Normal,
    /// Every row's classifications are logged at info level
    Detailed,
}

impl Verbosity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quiet => "quiet",
            Self::Normal => "normal",
            Self::Detailed => "detailed",
        }
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verbosity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "quiet" => Ok(Self::Quiet),
            "normal" => Ok(Self::Normal),
            "detailed" | "verbose" => Ok(Self::Detailed),
            other => Err(format!("unknown verbosity: {}", other)),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and optional config file
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = Self::builder_with_defaults()?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables with CDR_ prefix
            .add_source(Self::environment())
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Self::builder_with_defaults()?
            .add_source(File::with_name(path))
            .add_source(Self::environment())
            .build()?;

        config.try_deserialize()
    }

    /// `CDR_SECTION__KEY` overrides, with numbers and booleans parsed
    fn environment() -> Environment {
        Environment::with_prefix("CDR")
            .separator("__")
            .try_parsing(true)
    }

    fn builder_with_defaults(
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("feed.input_dir", "./incoming")?
            .set_default("feed.file_pattern", "cdr_{date}.csv")?
            .set_default("feed.delimiter", ";")?
            .set_default("processing.source_timezone", "America/Los_Angeles")?
            .set_default("processing.verbosity", "normal")?
            .set_default("processing.alert_min_threshold", 5)?
            .set_default("processing.alert_ratio", 0.10)
    }

    /// Delimiter as the single byte the CSV reader expects
    pub fn delimiter_byte(&self) -> Result<u8, ConfigError> {
        let c = self.feed.delimiter;
        if c.is_ascii() {
            Ok(c as u8)
        } else {
            Err(ConfigError::Message(format!(
                "feed.delimiter must be a single ASCII character, got {:?}",
                c
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_processing_config() {
        let config = ProcessingConfig::default();
        assert_eq!(config.alert_min_threshold, 5);
        assert_eq!(config.source_timezone, "America/Los_Angeles");
        assert_eq!(config.verbosity, Verbosity::Normal);
    }

    #[test]
    fn test_verbosity_parse() {
        assert_eq!("quiet".parse::<Verbosity>(), Ok(Verbosity::Quiet));
        assert_eq!(" Detailed ".parse::<Verbosity>(), Ok(Verbosity::Detailed));
        assert!("loud".parse::<Verbosity>().is_err());
    }

    #[test]
    fn test_defaults_deserialize() {
        let config: AppConfig = AppConfig::builder_with_defaults()
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.feed.file_pattern, "cdr_{date}.csv");
        assert_eq!(config.delimiter_byte().unwrap(), b';');
        assert!(config.database.is_none());
        assert!(config.alerts.output_dir.is_none());
    }

    #[test]
    fn test_environment_values_are_typed() {
        let vars: config::Map<String, String> = [
            ("CDR_PROCESSING__ALERT_MIN_THRESHOLD", "12"),
            ("CDR_PROCESSING__ALERT_RATIO", "0.25"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let config = Config::builder()
            .add_source(AppConfig::environment().source(Some(vars)))
            .build()
            .unwrap();

        assert_eq!(config.get_int("processing.alert_min_threshold").unwrap(), 12);
        assert_eq!(config.get_float("processing.alert_ratio").unwrap(), 0.25);
    }

    #[test]
    fn test_from_file_with_environment_override() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[feed]\ninput_dir = \"/data/cdr\"\n\n[processing]\nalert_min_threshold = 8"
        )
        .unwrap();

        env::set_var("CDR_PROCESSING__ALERT_RATIO", "0.5");
        let config = AppConfig::from_file(file.path().to_str().unwrap());
        env::remove_var("CDR_PROCESSING__ALERT_RATIO");

        let config = config.unwrap();
        assert_eq!(config.feed.input_dir, PathBuf::from("/data/cdr"));
        assert_eq!(config.processing.alert_min_threshold, 8);
        assert_eq!(config.processing.alert_ratio, 0.5);
        assert_eq!(config.processing.verbosity, Verbosity::Normal);
    }
}
