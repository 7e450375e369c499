//! Configuration management for pooldash
//!
//! The config is resolved exactly once in `main` (file, then CLI/env
//! overrides) and shared read-only as `Arc<Config>` from then on.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 5_000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_PRICE_API_URL: &str = "https://min-api.cryptocompare.com/data/price";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name shown in the dashboard header
    pub application_name: String,

    /// Ticker of the mined coin, also the price feed's `fsym`
    pub coin_name: String,

    /// Block explorer used for block, tx and address links
    pub block_explorer_url: String,

    /// Pool API base (the `/api/...` paths are appended)
    pub api_url: String,

    /// Price service endpoint
    pub price_api_url: String,

    /// Currencies to quote the coin in
    pub quote_currencies: Vec<String>,

    /// Delay between refresh cycles, measured from cycle completion
    pub refresh_interval_ms: u64,

    /// Per-request HTTP timeout
    pub request_timeout_secs: u64,

    /// Mining endpoints and pool terms, shown on the dashboard
    pub network: NetworkConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub http_host: String,
    pub http_port: u16,
    pub stratum_host: String,
    pub stratum_port: u16,
    pub pool_fee: String,
    pub payout_threshold: String,
    /// Average block time in seconds, used for network hashrate estimates
    pub block_time: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            http_host: "http://big-dwarf.com".to_string(),
            http_port: 6666,
            stratum_host: "big-dwarf.com".to_string(),
            stratum_port: 6006,
            pool_fee: "1%".to_string(),
            payout_threshold: "0.5 Ether".to_string(),
            block_time: 14.4,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            application_name: "Musicoin Pool".to_string(),
            coin_name: "MUSIC".to_string(),
            block_explorer_url: "https://orbiter.musicoin.org".to_string(),
            api_url: "http://big-dwarf.com:6060".to_string(),
            price_api_url: DEFAULT_PRICE_API_URL.to_string(),
            quote_currencies: vec!["BTC".to_string(), "USD".to_string()],
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            network: NetworkConfig::default(),
        }
    }

    /// Apply command-line / environment overrides. Consumes `self` so the
    /// result can be frozen behind an `Arc` right after.
    pub fn with_overrides(mut self, api_url: Option<String>, coin: Option<String>) -> Self {
        if let Some(api_url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api_url = api_url;
        }
        if let Some(coin) = coin.filter(|c| !c.trim().is_empty()) {
            self.coin_name = coin.trim().to_uppercase();
        }
        self
    }

    pub fn refresh_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }

    pub fn block_url(&self, height: u64) -> String {
        format!("{}/block/{}", self.explorer_base(), height)
    }

    pub fn tx_url(&self, hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_base(), hash)
    }

    pub fn address_url(&self, login: &str) -> String {
        format!("{}/account/{}", self.explorer_base(), login)
    }

    fn explorer_base(&self) -> &str {
        self.block_explorer_url.trim_end_matches('/')
    }

    /// Zero would poll in a tight loop or time out every request
    fn validate(&self) -> Result<()> {
        if self.refresh_interval_ms == 0 {
            anyhow::bail!("refresh_interval_ms must be greater than zero");
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than zero");
        }
        Ok(())
    }
}

/// Get the config file path
pub fn get_config_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("org", "pooldash", "pooldash")
        .context("Failed to determine config directory")?;

    let config_dir = proj_dirs.config_dir();
    std::fs::create_dir_all(config_dir)?;

    Ok(config_dir.join("config.toml"))
}

/// Load configuration from file
pub fn load_config() -> Result<Config> {
    let path = get_config_path()?;

    if !path.exists() {
        return Ok(Config::new());
    }

    let content = std::fs::read_to_string(&path).context("Failed to read config file")?;

    parse_config(&content)
}

fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).context("Failed to parse config file")?;
    config.validate().context("Invalid config file")?;

    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &Config) -> Result<()> {
    let path = get_config_path()?;

    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;

    std::fs::write(&path, content).context("Failed to write config file")?;

    Ok(())
}
