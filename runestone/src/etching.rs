//! The etching instruction: declares a new rune (spec §3, §4.E, §4.I).

use crate::rune::Rune;
use crate::terms::Terms;

/// Maximum value the `Divisibility` tag may carry: the number of decimal
/// places a rune's smallest unit can represent without its displayed
/// supply overflowing a `u128` (spec §4.E).
pub const MAX_DIVISIBILITY: u8 = 38;

/// A request to create a new rune, decoded from the `Flags::ETCHING` branch
/// of a runestone. Any field left `None` takes the protocol's default for
/// it (spec §4.E, §4.I): an absent `rune` is assigned the next reserved
/// name, absent `divisibility`/`premine` are zero, absent `symbol` is `¤`,
/// absent `spacers` is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Etching {
    pub divisibility: Option<u8>,
    pub premine: Option<u128>,
    pub rune: Option<Rune>,
    pub spacers: Option<u32>,
    pub symbol: Option<char>,
    pub terms: Option<Terms>,
    pub turbo: bool,
}

impl Etching {
    /// Whether the declared `divisibility` and the combination of `premine`
    /// and open-mint terms stay within the bounds the protocol requires
    /// (spec §4.E: divisibility at most 38; `amount * cap` must itself fit
    /// `u128`; premine plus every mint the terms could ever produce must
    /// not overflow `u128`).
    pub fn is_valid_supply(&self) -> bool {
        if self.divisibility.is_some_and(|d| d > MAX_DIVISIBILITY) {
            return false;
        }

        let Some(terms) = self.terms else {
            return true;
        };

        if terms.mint_supply_overflows() {
            return false;
        }

        let premine = self.premine.unwrap_or_default();

        match terms.maximum_supply() {
            Some(terms_supply) => premine.checked_add(terms_supply).is_some(),
            // unbounded cap/amount: only the premine itself needs to fit,
            // the open mint has no hard ceiling.
            None => true,
        }
    }
}
