//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Election rules.
    #[serde(default)]
    pub election: ElectionConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Election rules.
#[derive(Debug, Clone, Deserialize)]
pub struct ElectionConfig {
    /// Minimum number of voting-eligible committee members required to open an election.
    #[serde(default = "default_min_voting_members")]
    pub min_voting_members: usize,
    /// Days after which an open election counts as expired.
    #[serde(default = "default_approval_expiration_days")]
    pub approval_expiration_days: i64,
    /// Interval of the expired-election sweep, in seconds.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for ElectionConfig {
    fn default() -> Self {
        Self {
            min_voting_members: default_min_voting_members(),
            approval_expiration_days: default_approval_expiration_days(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

const fn default_min_voting_members() -> usize {
    4
}

const fn default_approval_expiration_days() -> i64 {
    7
}

const fn default_sweep_interval_secs() -> u64 {
    3600
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `DAC_ENV`)
    /// 3. Environment variables with `DAC__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("DAC_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("DAC")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::from_source(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("DAC")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::from_source(config)
    }

    fn from_source(source: config::Config) -> Result<Self, config::ConfigError> {
        let config: Self = source.try_deserialize()?;
        if config.election.sweep_interval_secs == 0 {
            return Err(config::ConfigError::Message(
                "election.sweep_interval_secs must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }
}
