//! Subcommands, mirroring the teacher's `cmd::Subcommand` dispatch
//! (`orbtc/src/cmd/mod.rs`) but scoped to this spec's three operations:
//! decode a transaction, encode a runestone, and run the indexer.

pub mod decode;
pub mod encode;
pub mod index;

use clap::Parser;

#[derive(Debug, Parser)]
pub enum Subcommand {
    #[command(about = "Decode a raw transaction's runestone, if it carries one")]
    Decode(decode::DecodeCmd),

    #[command(about = "Encode a runestone from CLI flags and print its script")]
    Encode(encode::EncodeCmd),

    #[command(about = "Walk a bitcoind node's blocks into a runes ledger")]
    Index(index::IndexCmd),

    #[command(about = "Print a default index config as TOML")]
    ExampleConfig,
}

impl Subcommand {
    pub fn run(&self) -> anyhow::Result<()> {
        match self {
            Subcommand::Decode(cmd) => cmd.run(),
            Subcommand::Encode(cmd) => cmd.run(),
            Subcommand::Index(cmd) => cmd.run(),
            Subcommand::ExampleConfig => {
                let cfg = crate::config::Config::default();
                let output = toml::to_string_pretty(&cfg)?;
                println!("{output}");
                Ok(())
            }
        }
    }
}
