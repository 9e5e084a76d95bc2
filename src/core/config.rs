use crate::core::coin::CurrencyUnit;
use crate::core::view::{MAX_DISPLAY_COUNT, Timeframe};
use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

/// Environment variable that overrides the configured API key.
pub const API_KEY_ENV: &str = "CMC_PRO_API_KEY";

#[derive(Deserialize, Serialize, Clone)]
pub struct CoinMarketCapConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    crate::providers::coinmarketcap::DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

// Keeps the API key out of debug logs.
impl std::fmt::Debug for CoinMarketCapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoinMarketCapConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for CoinMarketCapConfig {
    fn default() -> Self {
        CoinMarketCapConfig {
            base_url: default_base_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub coinmarketcap: CoinMarketCapConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CacheConfig {
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig { ttl_secs: 300 }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ViewConfig {
    #[serde(default = "default_top")]
    pub top: usize,
    #[serde(default = "default_timeframe")]
    pub timeframe: Timeframe,
    #[serde(default = "default_sort")]
    pub sort: bool,
}

fn default_top() -> usize {
    MAX_DISPLAY_COUNT
}

fn default_timeframe() -> Timeframe {
    Timeframe::SevenDays
}

fn default_sort() -> bool {
    true
}

impl Default for ViewConfig {
    fn default() -> Self {
        ViewConfig {
            top: default_top(),
            timeframe: default_timeframe(),
            sort: default_sort(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub currency: CurrencyUnit,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub view: ViewConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "cryptodash", "cryptodash")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Picks the API key, preferring the environment over the config file.
    pub fn api_key(&self) -> Result<String> {
        self.api_key_from(std::env::var(API_KEY_ENV).ok())
    }

    fn api_key_from(&self, env_value: Option<String>) -> Result<String> {
        match env_value
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.providers.coinmarketcap.api_key.clone())
        {
            Some(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => bail!(
                "No CoinMarketCap API key configured. Set {} or providers.coinmarketcap.api_key",
                API_KEY_ENV
            ),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.providers.coinmarketcap.timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }
}
