//! A [`Rune`] paired with spacer bits for display purposes (spec §3).

use std::fmt;
use std::str::FromStr;

use crate::rune::Rune;

/// A rune name together with the spacer bits an etching chose for display,
/// e.g. `UNCOMMON•GOODS`. Spacers carry no consensus meaning beyond
/// rendering; two spaced runes with the same `rune` but different `spacers`
/// refer to the same underlying balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpacedRune {
    pub rune: Rune,
    pub spacers: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SpacedRuneFromStrError {
    #[error("leading spacer")]
    LeadingSpacer,
    #[error("trailing spacer")]
    TrailingSpacer,
    #[error("double spacer")]
    DoubleSpacer,
    #[error(transparent)]
    Rune(#[from] crate::rune::RuneFromStrError),
}

impl SpacedRune {
    pub fn new(rune: Rune, spacers: u32) -> Self {
        Self { rune, spacers }
    }

    /// True if `spacers` sets a bit past the end of the rendered name, which
    /// has no letter boundary for it to separate.
    pub fn has_significant_spacers_beyond_name(&self) -> bool {
        let name_len = self.rune.to_string().len();

        if name_len == 0 {
            return self.spacers != 0;
        }

        // a name of length n has n - 1 internal letter boundaries.
        let max_valid = if name_len >= 32 {
            u32::MAX
        } else {
            (1u32 << (name_len - 1)) - 1
        };

        self.spacers & !max_valid != 0
    }
}

impl fmt::Display for SpacedRune {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.rune.to_string();

        for (i, c) in name.chars().enumerate() {
            if i > 0 && self.spacers & (1 << (i - 1)) != 0 {
                write!(f, "\u{2022}")?;
            }

            write!(f, "{c}")?;
        }

        Ok(())
    }
}

impl FromStr for SpacedRune {
    type Err = SpacedRuneFromStrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut name = String::new();
        let mut spacers = 0u32;

        for c in s.chars() {
            if c.is_ascii_uppercase() {
                name.push(c);
                continue;
            }

            if c == '•' || c == '.' {
                let i = name.len();

                if i == 0 {
                    return Err(SpacedRuneFromStrError::LeadingSpacer);
                }

                let bit = 1u32 << (i - 1);

                if spacers & bit != 0 {
                    return Err(SpacedRuneFromStrError::DoubleSpacer);
                }

                spacers |= bit;
                continue;
            }

            return Err(SpacedRuneFromStrError::Rune(
                crate::rune::RuneFromStrError::InvalidCharacter,
            ));
        }

        if spacers & (1 << (name.len().saturating_sub(1))) != 0 {
            return Err(SpacedRuneFromStrError::TrailingSpacer);
        }

        let rune = Rune::from_str(&name)?;

        Ok(Self { rune, spacers })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_spacers_between_letters() {
        let spaced = SpacedRune::from_str("UNCOMMON•GOODS").unwrap();
        assert_eq!(spaced.to_string(), "UNCOMMON•GOODS");
    }

    #[test]
    fn rejects_leading_and_trailing_spacers() {
        assert_eq!(
            SpacedRune::from_str("•A"),
            Err(SpacedRuneFromStrError::LeadingSpacer)
        );
        assert_eq!(
            SpacedRune::from_str("A•"),
            Err(SpacedRuneFromStrError::TrailingSpacer)
        );
    }

    #[test]
    fn rejects_doubled_spacers() {
        assert_eq!(
            SpacedRune::from_str("A••B"),
            Err(SpacedRuneFromStrError::DoubleSpacer)
        );
    }

    #[test]
    fn accepts_dot_as_spacer_alias() {
        assert_eq!(
            SpacedRune::from_str("A.B").unwrap(),
            SpacedRune::from_str("A•B").unwrap()
        );
    }

    #[test]
    fn detects_spacer_bits_beyond_the_name() {
        let spaced = SpacedRune::new(Rune::from_str("AB").unwrap(), 0b10);
        assert!(spaced.has_significant_spacers_beyond_name());

        let spaced = SpacedRune::new(Rune::from_str("AB").unwrap(), 0b1);
        assert!(!spaced.has_significant_spacers_beyond_name());
    }
}
