//! The result of deciphering a transaction's runestone payload (spec §3,
//! §4.F): either a well-formed [`Runestone`] or a [`Cenotaph`] recording why
//! it wasn't one.

use crate::cenotaph::Cenotaph;
use crate::runestone::Runestone;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    Runestone(Runestone),
    Cenotaph(Cenotaph),
}

impl Artifact {
    pub fn as_runestone(&self) -> Option<&Runestone> {
        match self {
            Self::Runestone(runestone) => Some(runestone),
            Self::Cenotaph(_) => None,
        }
    }

    pub fn as_cenotaph(&self) -> Option<&Cenotaph> {
        match self {
            Self::Runestone(_) => None,
            Self::Cenotaph(cenotaph) => Some(cenotaph),
        }
    }

    /// The rune a pending mint targets, whichever variant this artifact
    /// is — a cenotaph still consumes a mint's count even though it pays
    /// out nothing (spec §4.I step 6).
    pub fn mint(&self) -> Option<crate::rune_id::RuneId> {
        match self {
            Self::Runestone(runestone) => runestone.mint,
            Self::Cenotaph(cenotaph) => cenotaph.mint,
        }
    }
}
