//! Runs the indexer to the chain tip, mirroring `orbtc::cmd::RuneIndexer::run`
//! (`orbtc/src/cmd/indexer.rs`) but against the `Storage`/`BitcoinRpc` trait
//! boundary instead of a direct Postgres connection, and synchronously —
//! `RunestoneIndexer::update` performs no async I/O of its own.

use clap::Parser;
use runestone_indexer::{BitcoincoreRpc, MemoryStorage, RunestoneIndexer};

use crate::config::Config;

#[derive(Debug, Parser)]
pub struct IndexCmd {
    /// Path to the TOML config file (see `example-config`).
    #[arg(short, long, default_value_t = String::from("config.toml"))]
    pub config: String,

    /// Apply blocks and report the summary, but never commit them.
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Override the config's starting height.
    #[arg(long)]
    pub block: Option<u64>,
}

impl IndexCmd {
    pub fn run(&self) -> anyhow::Result<()> {
        let mut cfg = Config::read(&self.config)?;

        if self.dry_run {
            cfg.indexer.dry_run = true;
        }

        if let Some(block) = self.block {
            cfg.indexer.starting_height = block;
        }

        let network = cfg.btc.network();
        let rpc = BitcoincoreRpc::connect(&cfg.btc.address, cfg.btc.rpc_user.clone(), cfg.btc.rpc_password.clone())?;
        let storage = MemoryStorage::new();

        let mut indexer = RunestoneIndexer::new(storage, rpc, network, cfg.indexer.clone());

        log::info!("starting runestone indexer against {}", cfg.btc.address);

        let summary = indexer.update()?;

        log::info!(
            "indexed {} block(s), {} transaction(s), tip now at height {}",
            summary.blocks_indexed,
            summary.transactions_indexed,
            summary.chain_tip
        );

        Ok(())
    }
}
