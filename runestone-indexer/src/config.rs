//! Configuration for the indexer runtime, `serde`/TOML-loadable in the
//! teacher's style (`orbtc::config::BTCConfig`/`IndexingOpts`), but
//! threaded through as an owned value rather than stashed in a global
//! `OnceLock` — the singleton existed in the teacher to serve a REST/CLI
//! surface this spec doesn't carry over.

use serde::{Deserialize, Serialize};

/// Connection details for the `bitcoind` JSON-RPC endpoint this indexer
/// reads blocks from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BitcoinRpcConfig {
    pub address: String,
    pub rpc_user: String,
    pub rpc_password: String,
    #[serde(default)]
    pub network: Option<String>,
}

impl Default for BitcoinRpcConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8332".to_string(),
            rpc_user: String::new(),
            rpc_password: String::new(),
            network: Some("mainnet".to_string()),
        }
    }
}

impl BitcoinRpcConfig {
    pub fn network(&self) -> bitcoin::Network {
        match self.network.as_deref() {
            Some("mainnet") | None => bitcoin::Network::Bitcoin,
            Some("testnet") => bitcoin::Network::Testnet,
            Some("testnet4") => bitcoin::Network::Testnet4,
            Some("signet") => bitcoin::Network::Signet,
            Some("regtest") => bitcoin::Network::Regtest,
            Some(_) => bitcoin::Network::Bitcoin,
        }
    }
}

/// Tunables for a single [`RunestoneIndexer`](crate::RunestoneIndexer) run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Height to start from when storage has no prior tip recorded.
    #[serde(default)]
    pub starting_height: u64,
    /// Whether to keep walking blocks after a non-fork error instead of
    /// stopping at the first one (the core itself never retries
    /// automatically; this only governs `runestone-cli`'s driving loop).
    #[serde(default)]
    pub retry_on_fail: bool,
    /// Apply blocks and report the summary, but never call
    /// [`Storage::commit_block`](crate::Storage::commit_block).
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            starting_height: 0,
            retry_on_fail: false,
            dry_run: false,
        }
    }
}
