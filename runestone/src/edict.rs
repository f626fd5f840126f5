//! Transfer instructions carried in a runestone's body (spec §3, §4.E).

use crate::rune_id::RuneId;

/// One instruction to move `amount` of rune `id` to transaction output
/// `output`. `amount == 0` means "as much as possible", and `output` equal
/// to the transaction's output count means "split across every non-`OP_RETURN`
/// output" (spec §4.I).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edict {
    pub id: RuneId,
    pub amount: u128,
    pub output: u32,
}
