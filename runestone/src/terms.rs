//! Open minting terms attached to an etching (spec §3, §4.E, §4.I).

/// The minting schedule an etching may declare, bounding how much of a rune
/// the public can mint beyond the etcher's premine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Terms {
    /// Units minted per call to the `Mint` tag.
    pub amount: Option<u128>,
    /// Maximum number of times the terms may be invoked.
    pub cap: Option<u128>,
    /// Block-height window during which minting is allowed: inclusive of
    /// `start`, exclusive of `end` (the window closes *at* `end`, matching
    /// upstream Runes).
    pub height: (Option<u64>, Option<u64>),
    /// Window, relative to the etching height, during which minting is
    /// allowed; inclusive of `start`, exclusive of `end` like `height`.
    pub offset: (Option<u64>, Option<u64>),
}

impl Terms {
    /// Whether `amount * cap` is declared and overflows `u128`. Distinct
    /// from "unbounded" (a missing `cap`), which never overflows (spec
    /// §4.F step 2).
    pub fn mint_supply_overflows(&self) -> bool {
        matches!(
            (self.amount, self.cap),
            (Some(amount), Some(cap)) if amount.checked_mul(cap).is_none()
        )
    }

    /// Total units these terms can ever mint, or `None` if unbounded
    /// (missing cap) or if `amount * cap` overflows `u128` — callers that
    /// need to tell those two apart should check
    /// [`mint_supply_overflows`](Self::mint_supply_overflows) first.
    pub fn maximum_supply(&self) -> Option<u128> {
        match (self.amount, self.cap) {
            (Some(amount), Some(cap)) => amount.checked_mul(cap),
            _ => None,
        }
    }

    /// Whether minting is permitted at `height`, given the etching's own
    /// `etching_height` (spec §4.I: the height and offset windows both
    /// open at `start` and close at `end`, matching upstream Runes'
    /// `RuneEntry::mintable`, and both must be satisfied when present).
    pub fn is_open_at(&self, height: u64, etching_height: u64) -> bool {
        let height_ok = self.height.0.map_or(true, |start| height >= start)
            && self.height.1.map_or(true, |end| height < end);

        let offset_ok = self
            .offset
            .0
            .map_or(true, |start| height >= etching_height.saturating_add(start))
            && self
                .offset
                .1
                .map_or(true, |end| height < etching_height.saturating_add(end));

        height_ok && offset_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maximum_supply_multiplies_amount_by_cap() {
        let terms = Terms {
            amount: Some(100),
            cap: Some(10),
            ..Default::default()
        };
        assert_eq!(terms.maximum_supply(), Some(1000));
    }

    #[test]
    fn maximum_supply_is_none_without_a_cap() {
        let terms = Terms {
            amount: Some(100),
            ..Default::default()
        };
        assert_eq!(terms.maximum_supply(), None);
    }

    #[test]
    fn maximum_supply_overflow_is_none() {
        let terms = Terms {
            amount: Some(u128::MAX),
            cap: Some(2),
            ..Default::default()
        };
        assert_eq!(terms.maximum_supply(), None);
    }

    #[test]
    fn mint_supply_overflow_is_distinguished_from_unbounded() {
        let overflowing = Terms {
            amount: Some(u128::MAX),
            cap: Some(2),
            ..Default::default()
        };
        assert!(overflowing.mint_supply_overflows());

        let unbounded = Terms {
            amount: Some(u128::MAX),
            cap: None,
            ..Default::default()
        };
        assert!(!unbounded.mint_supply_overflows());
    }

    #[test]
    fn height_window_is_inclusive_of_start_and_exclusive_of_end() {
        let terms = Terms {
            height: (Some(10), Some(20)),
            ..Default::default()
        };
        assert!(!terms.is_open_at(9, 0));
        assert!(terms.is_open_at(10, 0));
        assert!(terms.is_open_at(19, 0));
        assert!(!terms.is_open_at(20, 0));
    }

    #[test]
    fn offset_window_is_relative_to_etching_height() {
        let terms = Terms {
            offset: (Some(5), Some(15)),
            ..Default::default()
        };
        assert!(!terms.is_open_at(104, 100));
        assert!(terms.is_open_at(105, 100));
        assert!(terms.is_open_at(114, 100));
        assert!(!terms.is_open_at(115, 100));
    }
}
