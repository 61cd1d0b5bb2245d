use crate::core::asset::AssetClass;
use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_COINCAP_URL: &str = "https://api.coincap.io";

fn default_coincap_timeout_ms() -> u64 {
    4_000
}

fn default_crypto_interval_ms() -> u64 {
    5_000
}

fn default_interval_ms() -> u64 {
    3_000
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CoinCapProviderConfig {
    pub base_url: String,
    #[serde(default = "default_coincap_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for CoinCapProviderConfig {
    fn default() -> Self {
        CoinCapProviderConfig {
            base_url: DEFAULT_COINCAP_URL.to_string(),
            timeout_ms: default_coincap_timeout_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub coincap: Option<CoinCapProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            coincap: Some(CoinCapProviderConfig::default()),
        }
    }
}

/// Per-class simulator volatility, as a dimensionless fraction per tick.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct VolatilityConfig {
    pub equity: f64,
    pub crypto: f64,
    pub fund: f64,
    pub digital_collectible: f64,
}

impl Default for VolatilityConfig {
    fn default() -> Self {
        VolatilityConfig {
            equity: 0.0008,
            crypto: 0.002,
            fund: 0.0015,
            digital_collectible: 0.003,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FeedConfig {
    #[serde(default = "default_crypto_interval_ms")]
    pub crypto_interval_ms: u64,
    #[serde(default = "default_interval_ms")]
    pub default_interval_ms: u64,
    #[serde(default)]
    pub volatility: VolatilityConfig,
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            crypto_interval_ms: default_crypto_interval_ms(),
            default_interval_ms: default_interval_ms(),
            volatility: VolatilityConfig::default(),
        }
    }
}

impl FeedConfig {
    pub fn interval_for(&self, asset_class: AssetClass) -> Duration {
        let ms = match asset_class {
            AssetClass::Crypto => self.crypto_interval_ms,
            _ => self.default_interval_ms,
        };
        Duration::from_millis(ms)
    }

    pub fn volatility_for(&self, asset_class: AssetClass) -> f64 {
        match asset_class {
            AssetClass::Equity => self.volatility.equity,
            AssetClass::Crypto => self.volatility.crypto,
            AssetClass::Fund => self.volatility.fund,
            AssetClass::DigitalCollectible => self.volatility.digital_collectible,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.crypto_interval_ms == 0 || self.default_interval_ms == 0 {
            bail!("Feed intervals must be greater than zero");
        }
        for class in [
            AssetClass::Equity,
            AssetClass::Crypto,
            AssetClass::Fund,
            AssetClass::DigitalCollectible,
        ] {
            let volatility = self.volatility_for(class);
            if !(0.0..1.0).contains(&volatility) {
                bail!("Volatility for {} must be within [0, 1), got {}", class, volatility);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WatchEntry {
    pub symbol: String,
    pub asset_class: AssetClass,
    pub price: f64,
    #[serde(default)]
    pub cost_basis: Option<f64>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub watchlist: Vec<WatchEntry>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "livefeed", "livefeed")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config
            .feed
            .validate()
            .with_context(|| format!("Invalid feed settings in {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn find_watch_entry(&self, symbol: &str) -> Option<&WatchEntry> {
        self.watchlist
            .iter()
            .find(|entry| entry.symbol.eq_ignore_ascii_case(symbol))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
watchlist:
  - symbol: "BTC"
    asset_class: crypto
    price: 60000.0
    cost_basis: 25000.0
  - symbol: "AAPL"
    asset_class: stock
    price: 190.5
  - symbol: "PUNK"
    asset_class: nft
    price: 42.0
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.watchlist.len(), 3);
        assert_eq!(config.watchlist[0].symbol, "BTC");
        assert_eq!(config.watchlist[0].asset_class, AssetClass::Crypto);
        assert_eq!(config.watchlist[0].cost_basis, Some(25000.0));
        assert_eq!(config.watchlist[1].asset_class, AssetClass::Equity);
        assert!(config.watchlist[1].cost_basis.is_none());
        assert_eq!(config.watchlist[2].asset_class, AssetClass::DigitalCollectible);

        // Absent sections fall back to defaults
        assert_eq!(config.feed, FeedConfig::default());
        assert_eq!(
            config.providers.coincap.unwrap().base_url,
            DEFAULT_COINCAP_URL.to_string()
        );

        let yaml_str_with_providers = r#"
providers:
  coincap:
    base_url: "http://example.com/coincap"
feed:
  crypto_interval_ms: 100
  volatility:
    equity: 0.001
watchlist: []
        "#;
        let config_with_providers: AppConfig =
            serde_yaml::from_str(yaml_str_with_providers).unwrap();
        let coincap = config_with_providers.providers.coincap.unwrap();
        assert_eq!(coincap.base_url, "http://example.com/coincap");
        assert_eq!(coincap.timeout_ms, 4_000);
        assert_eq!(config_with_providers.feed.crypto_interval_ms, 100);
        assert_eq!(config_with_providers.feed.default_interval_ms, 3_000);
        assert_eq!(config_with_providers.feed.volatility.equity, 0.001);
        assert_eq!(config_with_providers.feed.volatility.fund, 0.0015);
    }

    #[test]
    fn test_feed_cadence_and_volatility_by_class() {
        let feed = FeedConfig::default();
        assert_eq!(feed.interval_for(AssetClass::Crypto), Duration::from_secs(5));
        assert_eq!(feed.interval_for(AssetClass::Equity), Duration::from_secs(3));
        assert_eq!(feed.interval_for(AssetClass::Fund), Duration::from_secs(3));
        assert!(
            feed.volatility_for(AssetClass::Equity) < feed.volatility_for(AssetClass::Fund)
        );
        assert!(
            feed.volatility_for(AssetClass::Equity)
                < feed.volatility_for(AssetClass::DigitalCollectible)
        );
    }

    #[test]
    fn test_feed_validation() {
        assert!(FeedConfig::default().validate().is_ok());

        let zero_interval = FeedConfig {
            default_interval_ms: 0,
            ..FeedConfig::default()
        };
        assert!(zero_interval.validate().is_err());

        let mut wild = FeedConfig::default();
        wild.volatility.crypto = 1.5;
        let err = wild.validate().unwrap_err();
        assert!(err.to_string().contains("Volatility for crypto"));
    }

    #[test]
    fn test_load_from_path_rejects_invalid_feed() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "feed:\n  crypto_interval_ms: 0\n").unwrap();

        let result = AppConfig::load_from_path(file.path());
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Invalid feed settings")
        );
    }
}
