//! Mirrors the teacher's `ExtractTxCmd` (`orbtc/src/cmd/mod.rs`), but
//! decodes the runestone payload instead of just listing inputs.

use anyhow::Context;
use bitcoin::Transaction;
use clap::Parser;

#[derive(Debug, Parser)]
pub struct DecodeCmd {
    /// Raw transaction, hex-encoded.
    #[arg(long)]
    pub tx: String,
}

impl DecodeCmd {
    pub fn run(&self) -> anyhow::Result<()> {
        let bytes = hex::decode(&self.tx).context("transaction hex is malformed")?;
        let tx: Transaction = bitcoin::consensus::deserialize(&bytes).context("not a valid transaction")?;

        match runestone::decode(&tx) {
            Some(artifact) => println!("{artifact:#?}"),
            None => println!("no runestone in this transaction"),
        }

        Ok(())
    }
}
