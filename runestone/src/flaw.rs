//! Recognized defects that downgrade a parsed message to a [`Cenotaph`](crate::Cenotaph)
//! (spec §3, §4.F).

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Flaw {
    EdictOutput,
    EdictRuneId,
    InvalidScript,
    Opcode,
    SupplyOverflow,
    TrailingIntegers,
    TruncatedField,
    UnrecognizedEvenTag,
    UnrecognizedFlag,
    Varint,
}

impl fmt::Display for Flaw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::EdictOutput => "edict output greater than transaction output count",
            Self::EdictRuneId => "invalid rune id in edict",
            Self::InvalidScript => "invalid script",
            Self::Opcode => "non-data-push opcode",
            Self::SupplyOverflow => "supply overflows u128",
            Self::TrailingIntegers => "trailing integers in body",
            Self::TruncatedField => "field truncated",
            Self::UnrecognizedEvenTag => "unrecognized even tag",
            Self::UnrecognizedFlag => "unrecognized flag",
            Self::Varint => "invalid varint",
        })
    }
}
