//! Keeper configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Polling interval in seconds
    pub poll_interval_secs: u64,

    /// Debt recovered per liquidation call, in whole synthetic dollars
    pub max_debt_to_recover_usd: u64,

    /// Maximum liquidations per sweep
    pub max_liquidations_per_sweep: usize,

    /// Number of borrower accounts in the local simulation
    pub borrowers: usize,
}

impl Config {
    /// Load configuration from TOML file
    pub fn load() -> Result<Self> {
        let config_path =
            std::env::var("KEEPER_CONFIG").unwrap_or_else(|_| "keeper-config.toml".to_string());

        let config_str = std::fs::read_to_string(&config_path)
            .context(format!("Failed to read config file: {}", config_path))?;

        let config: Config = toml::from_str(&config_str).context("Failed to parse config TOML")?;

        Ok(config)
    }

    /// Create default configuration
    pub fn default_local() -> Self {
        Self {
            poll_interval_secs: 2,
            max_debt_to_recover_usd: 50_000,
            max_liquidations_per_sweep: 3,
            borrowers: 6,
        }
    }

    /// Write default config to file
    pub fn write_default(path: &str) -> Result<()> {
        let config = Self::default_local();
        let toml_str = toml::to_string_pretty(&config).context("Failed to serialize config")?;

        std::fs::write(path, toml_str).context(format!("Failed to write config to {}", path))?;

        log::info!("Created default config at {}", path);
        Ok(())
    }
}
