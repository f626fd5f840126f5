//! Builds a `Runestone` from flags and prints the script/commitment the
//! way `orbtc`'s `ExtractTxCmd` prints a decoded transaction's shape,
//! just in the encode direction.

use anyhow::Context;
use clap::Parser;
use runestone::{Edict, Etching, Runestone, SpacedRune, Terms};

#[derive(Debug, Parser)]
pub struct EncodeCmd {
    /// Spaced rune name to etch, e.g. `UNCOMMON•GOODS`. Omit for a
    /// runestone with no etching.
    #[arg(long)]
    pub etch: Option<String>,

    #[arg(long, default_value_t = 0)]
    pub divisibility: u8,

    #[arg(long, default_value_t = 0)]
    pub premine: u128,

    /// Single-character ticker symbol for the etched rune.
    #[arg(long)]
    pub symbol: Option<char>,

    #[arg(long, default_value_t = false)]
    pub turbo: bool,

    /// Units minted per open-mint call; requires `--mint-cap`.
    #[arg(long)]
    pub mint_amount: Option<u128>,

    #[arg(long)]
    pub mint_cap: Option<u128>,

    /// An existing rune to mint from, as `block:tx`.
    #[arg(long)]
    pub mint: Option<String>,

    /// Repeatable edict as `block:tx/amount/output`.
    #[arg(long = "edict")]
    pub edicts: Vec<String>,

    /// Output index unallocated balances fall back to.
    #[arg(long)]
    pub pointer: Option<u32>,
}

impl EncodeCmd {
    pub fn run(&self) -> anyhow::Result<()> {
        let etching = self
            .etch
            .as_ref()
            .map(|name| self.build_etching(name))
            .transpose()?;

        let mint = self
            .mint
            .as_ref()
            .map(|id| id.parse())
            .transpose()
            .context("--mint must be `block:tx`")?;

        let edicts = self
            .edicts
            .iter()
            .map(|edict| parse_edict(edict))
            .collect::<anyhow::Result<Vec<_>>>()?;

        let runestone = Runestone {
            edicts,
            etching,
            mint,
            pointer: self.pointer,
        };

        let (script, commitment) = runestone::encode(&runestone)?;

        println!("script = {}", hex::encode(script.as_bytes()));

        if let Some(commitment) = commitment {
            println!("commitment = {}", hex::encode(commitment));
        }

        Ok(())
    }

    fn build_etching(&self, name: &str) -> anyhow::Result<Etching> {
        let spaced_rune: SpacedRune = name.parse().context("invalid rune name")?;

        let terms = match (self.mint_amount, self.mint_cap) {
            (None, None) => None,
            (amount, cap) => Some(Terms {
                amount,
                cap,
                height: (None, None),
                offset: (None, None),
            }),
        };

        Ok(Etching {
            divisibility: Some(self.divisibility),
            premine: Some(self.premine),
            rune: Some(spaced_rune.rune),
            spacers: Some(spaced_rune.spacers),
            symbol: self.symbol,
            terms,
            turbo: self.turbo,
        })
    }
}

fn parse_edict(spec: &str) -> anyhow::Result<Edict> {
    let (id, rest) = spec
        .split_once('/')
        .context("edict must be `block:tx/amount/output`")?;
    let (amount, output) = rest
        .split_once('/')
        .context("edict must be `block:tx/amount/output`")?;

    Ok(Edict {
        id: id.parse().context("invalid rune id in edict")?,
        amount: amount.parse().context("invalid amount in edict")?,
        output: output.parse().context("invalid output index in edict")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use runestone::RuneId;

    #[test]
    fn parses_a_well_formed_edict() {
        let edict = parse_edict("840000:1/500/2").unwrap();
        assert_eq!(
            edict,
            Edict {
                id: RuneId::new(840_000, 1),
                amount: 500,
                output: 2,
            }
        );
    }

    #[test]
    fn rejects_an_edict_missing_a_field() {
        assert!(parse_edict("840000:1/500").is_err());
    }
}
