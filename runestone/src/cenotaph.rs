//! The malformed-message counterpart to [`Runestone`](crate::Runestone)
//! (spec §3, §4.F).

use std::collections::BTreeSet;

use crate::flaw::Flaw;
use crate::rune::Rune;
use crate::rune_id::RuneId;

/// A runestone that failed to decode cleanly. Per spec §4.F, a cenotaph
/// still burns every input rune and consumes any pending mint, but conveys
/// no balances of its own: `etching` and `mint`, when present, are recorded
/// only so the ledger can account for the rune they would have touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cenotaph {
    pub flaws: BTreeSet<Flaw>,
    pub etching: Option<Rune>,
    pub mint: Option<RuneId>,
}
