//! Rune identifiers keyed on the block and transaction index of their
//! etching (spec §4.H).

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::flaw::Flaw;

/// Identifies a rune by the block height and transaction index of the
/// transaction that etched it. Lexicographically ordered by `(block, tx)`,
/// which is also genesis order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuneId {
    pub block: u64,
    pub tx: u32,
}

impl RuneId {
    pub const fn new(block: u64, tx: u32) -> Self {
        Self { block, tx }
    }

    /// Whether this id names the transaction currently being indexed, used
    /// to resolve an edict's `RuneId { block: 0, tx: n }` shorthand meaning
    /// "the `n`th rune etched in this very transaction" (spec §4.H).
    pub fn is_relative_placeholder(self) -> bool {
        self.block == 0 && self.tx > 0
    }

    /// Encodes the distance from `self` to `next` as `(block_delta,
    /// tx_delta)`, the compact form edicts use on the wire: `tx_delta` is
    /// relative to `next.tx` only when `block_delta` is zero, otherwise it
    /// is `next.tx` itself (spec §4.G).
    pub fn delta(self, next: RuneId) -> Option<(u128, u128)> {
        let block_delta = next.block.checked_sub(self.block)?;

        let tx_delta = if block_delta == 0 {
            next.tx.checked_sub(self.tx)?
        } else {
            next.tx
        };

        Some((u128::from(block_delta), u128::from(tx_delta)))
    }

    /// Inverse of [`delta`](Self::delta): reconstructs the next id from
    /// `self` and a decoded `(block_delta, tx_delta)` pair, failing with
    /// [`Flaw::EdictRuneId`] on overflow or when the deltas don't fit their
    /// native widths.
    pub fn apply_delta(self, block_delta: u128, tx_delta: u128) -> Result<RuneId, Flaw> {
        let block_delta: u64 = block_delta.try_into().map_err(|_| Flaw::EdictRuneId)?;

        let block = self
            .block
            .checked_add(block_delta)
            .ok_or(Flaw::EdictRuneId)?;

        let tx = if block_delta == 0 {
            let tx_delta: u32 = tx_delta.try_into().map_err(|_| Flaw::EdictRuneId)?;
            self.tx.checked_add(tx_delta).ok_or(Flaw::EdictRuneId)?
        } else {
            tx_delta.try_into().map_err(|_| Flaw::EdictRuneId)?
        };

        Ok(RuneId { block, tx })
    }
}

impl PartialOrd for RuneId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RuneId {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.block, self.tx).cmp(&(other.block, other.tx))
    }
}

impl fmt::Display for RuneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.block, self.tx)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RuneIdFromStrError {
    #[error("rune id missing the `:` separator")]
    Separator,
    #[error("rune id block was not a valid number")]
    Block,
    #[error("rune id tx index was not a valid number")]
    Tx,
}

impl FromStr for RuneId {
    type Err = RuneIdFromStrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (block, tx) = s.split_once(':').ok_or(RuneIdFromStrError::Separator)?;

        Ok(RuneId {
            block: block.parse().map_err(|_| RuneIdFromStrError::Block)?,
            tx: tx.parse().map_err(|_| RuneIdFromStrError::Tx)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_lexicographically_by_block_then_tx() {
        assert!(RuneId::new(1, 0) < RuneId::new(1, 1));
        assert!(RuneId::new(1, 5) < RuneId::new(2, 0));
    }

    #[test]
    fn display_and_parse_round_trip() {
        let id = RuneId::new(840_000, 7);
        assert_eq!(id.to_string(), "840000:7");
        assert_eq!(RuneId::from_str("840000:7").unwrap(), id);
    }

    #[test]
    fn delta_is_tx_relative_within_the_same_block() {
        let base = RuneId::new(100, 3);
        let next = RuneId::new(100, 9);

        let (block_delta, tx_delta) = base.delta(next).unwrap();
        assert_eq!((block_delta, tx_delta), (0, 6));
        assert_eq!(base.apply_delta(block_delta, tx_delta).unwrap(), next);
    }

    #[test]
    fn delta_uses_absolute_tx_across_blocks() {
        let base = RuneId::new(100, 3);
        let next = RuneId::new(101, 2);

        let (block_delta, tx_delta) = base.delta(next).unwrap();
        assert_eq!((block_delta, tx_delta), (1, 2));
        assert_eq!(base.apply_delta(block_delta, tx_delta).unwrap(), next);
    }

    #[test]
    fn delta_rejects_non_increasing_ids() {
        let base = RuneId::new(100, 3);
        assert_eq!(base.delta(RuneId::new(100, 2)), None);
        assert_eq!(base.delta(RuneId::new(99, 9)), None);
    }

    #[test]
    fn apply_delta_overflow_is_an_edict_rune_id_flaw() {
        let base = RuneId::new(u64::MAX, 0);
        assert_eq!(base.apply_delta(1, 0), Err(Flaw::EdictRuneId));
    }
}
