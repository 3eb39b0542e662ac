//! Configuration management for lurewatch.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pipeline::DEFAULT_CHANNEL_CAPACITY;
use crate::terms::{TermMatcher, DEFAULT_MIN_MATCHES, DEFAULT_TERMS};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "lurewatch";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "notifications.db";

/// Longest retention window accepted, about a century.
pub const MAX_RETENTION_DAYS: u32 = 36_500;

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `LUREWATCH_`)
/// 2. TOML config file at `~/.config/lurewatch/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Term matching configuration.
    pub matching: MatchingConfig,
    /// Default input files.
    pub inputs: InputsConfig,
    /// Notification log configuration.
    pub storage: StorageConfig,
    /// Scan pipeline configuration.
    pub pipeline: PipelineConfig,
}

/// Term matching configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Terms that flag a domain.
    pub terms: Vec<String>,
    /// How many distinct terms make a lure.
    pub min_matches: usize,
}

/// Default input file locations, used when the CLI doesn't name them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputsConfig {
    /// Candidate domains, one per line.
    pub domains: Option<PathBuf>,
    /// Subscriptions, JSON lines of `{"id", "term"}`.
    pub subscriptions: Option<PathBuf>,
    /// Reporting graph, JSON lines of `{"id", "reports_to"}`.
    pub graph: Option<PathBuf>,
}

/// Notification log configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/lurewatch/notifications.db`
    pub database_path: Option<PathBuf>,
    /// Drop notifications older than this many days after each recorded scan.
    /// Set to 0 to keep everything.
    pub retention_days: u32,
}

/// Scan pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Bound on domains in flight between reader and matcher.
    pub channel_capacity: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            terms: DEFAULT_TERMS.iter().map(|t| (*t).to_string()).collect(),
            min_matches: DEFAULT_MIN_MATCHES,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None, // Resolved to the data dir at runtime
            retention_days: 90,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl Config {
    /// Load configuration from all sources, reading the TOML layer from
    /// `config_path` or the default location.
    ///
    /// A missing file is not an error; defaults and environment still apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("LUREWATCH_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.matching.terms.is_empty() {
            return Err(Error::ConfigValidation {
                message: "matching.terms must not be empty".to_string(),
            });
        }

        if let Some(blank) = self.matching.terms.iter().position(|t| t.trim().is_empty()) {
            return Err(Error::ConfigValidation {
                message: format!("matching.terms[{blank}] is blank"),
            });
        }

        if self.matching.min_matches == 0 {
            return Err(Error::ConfigValidation {
                message: "matching.min_matches must be greater than 0".to_string(),
            });
        }

        // Terms are deduplicated case-insensitively, so the threshold is
        // checked against what the matcher actually compiles.
        if let Err(e) = self.term_matcher() {
            let message = match e {
                Error::InvalidThreshold { min_matches, terms } => format!(
                    "matching.min_matches ({min_matches}) cannot be greater than the number of distinct terms ({terms})"
                ),
                other => format!("matching.terms: {other}"),
            };
            return Err(Error::ConfigValidation { message });
        }

        if self.storage.retention_days > MAX_RETENTION_DAYS {
            return Err(Error::ConfigValidation {
                message: format!(
                    "storage.retention_days ({}) cannot exceed {MAX_RETENTION_DAYS}",
                    self.storage.retention_days
                ),
            });
        }

        if self.pipeline.channel_capacity == 0 {
            return Err(Error::ConfigValidation {
                message: "pipeline.channel_capacity must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Build the term matcher described by `[matching]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the term list is unusable.
    pub fn term_matcher(&self) -> Result<TermMatcher> {
        TermMatcher::new(&self.matching.terms, self.matching.min_matches)
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the retention window, or `None` to keep everything.
    #[must_use]
    pub fn retention(&self) -> Option<chrono::Duration> {
        if self.storage.retention_days == 0 {
            None
        } else {
            chrono::Duration::try_days(i64::from(self.storage.retention_days))
        }
    }
}
