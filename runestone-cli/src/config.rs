//! The `index` subcommand's on-disk config, combining the indexer
//! crate's two config structs the way `orbtc::config::Config` bundles
//! `BTCConfig`/`DBConfig`/etc. into one TOML document.

use std::fs;

use runestone_indexer::{BitcoinRpcConfig, IndexerConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub btc: BitcoinRpcConfig,
    #[serde(default)]
    pub indexer: IndexerConfig,
}

impl Config {
    pub fn read(path: &str) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }
}
