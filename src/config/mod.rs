use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Network stats endpoint (aggregate supply + address counts)
    #[serde(default = "default_stats_url")]
    pub stats_url: String,
    /// Spot price endpoint
    #[serde(default = "default_price_url")]
    pub price_url: String,
    /// User-Agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Snapshot refresh interval for watch mode, in seconds
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_stats_url() -> String {
    "https://api.blockchain.info".to_string()
}
fn default_price_url() -> String {
    "https://api.coingecko.com/api/v3".to_string()
}
fn default_user_agent() -> String {
    format!("satrank/{}", env!("CARGO_PKG_VERSION"))
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_refresh_interval_secs() -> u64 {
    900
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            stats_url: default_stats_url(),
            price_url: default_price_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            refresh_interval_secs: default_refresh_interval_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Config {
    /// Load config from a TOML file, then overlay environment variables.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;
        config.apply_env();
        Ok(config)
    }

    /// Defaults plus environment overrides (no file needed).
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("SATRANK_STATS_URL") {
            self.provider.stats_url = url;
        }
        if let Ok(url) = std::env::var("SATRANK_PRICE_URL") {
            self.provider.price_url = url;
        }
        if let Ok(level) = std::env::var("SATRANK_LOG_LEVEL") {
            self.logging.level = level;
        }
    }
}
