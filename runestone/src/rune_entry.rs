//! Ledger-visible state of a single rune (spec §3: `RuneEntry`).

use crate::etching::Etching;
use crate::rune::Rune;
use crate::rune_id::RuneId;
use crate::terms::Terms;

/// Everything the ledger tracks about a rune after its etching, updated as
/// mints and burns occur. This is the row a [`Storage`](crate::ledger)
/// implementation persists per [`RuneId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuneEntry {
    pub rune_id: RuneId,
    pub rune: Rune,
    pub spacers: u32,
    pub divisibility: u8,
    pub symbol: Option<char>,
    pub premine: u128,
    pub terms: Option<Terms>,
    pub turbo: bool,
    /// Block the etching confirmed in, used to anchor `terms.offset`.
    pub etching_height: u64,
    /// Number of times the mint terms have been successfully invoked.
    pub mints: u128,
    /// Units burned over this rune's lifetime (cenotaph burns and
    /// unclaimed `OP_RETURN` sweeps).
    pub burned: u128,
}

impl RuneEntry {
    /// Builds the initial ledger entry for a freshly validated etching.
    pub fn from_etching(rune_id: RuneId, etching: &Etching, rune: Rune, etching_height: u64) -> Self {
        Self {
            rune_id,
            rune,
            spacers: etching.spacers.unwrap_or_default(),
            divisibility: etching.divisibility.unwrap_or_default(),
            symbol: etching.symbol,
            premine: etching.premine.unwrap_or_default(),
            terms: etching.terms,
            turbo: etching.turbo,
            etching_height,
            mints: 0,
            burned: 0,
        }
    }

    /// Total units ever minted, including the premine.
    pub fn supply(&self) -> u128 {
        let minted = self
            .terms
            .and_then(|terms| terms.amount)
            .and_then(|amount| amount.checked_mul(self.mints))
            .unwrap_or(0);

        self.premine.saturating_add(minted)
    }

    /// Whether the mint terms permit one more call at `height`.
    pub fn mint_is_open(&self, height: u64) -> bool {
        let Some(terms) = self.terms else {
            return false;
        };

        if terms.cap.is_some_and(|cap| self.mints >= cap) {
            return false;
        }

        terms.is_open_at(height, self.etching_height)
    }

    /// Units a successful mint call credits, or zero if the terms don't
    /// specify an amount.
    pub fn mint_amount(&self) -> u128 {
        self.terms.and_then(|terms| terms.amount).unwrap_or(0)
    }
}
