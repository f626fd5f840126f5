//! Caller-facing encoding failures (spec §7): mistakes in the values handed
//! to [`Runestone::encipher`](crate::Runestone::encipher) and related
//! constructors, as opposed to [`Flaw`](crate::Flaw)s found while decoding
//! someone else's transaction.

/// An etching or edict that cannot be encoded because it violates a
/// protocol bound. Unlike [`Flaw`](crate::Flaw), this is the caller's own
/// mistake and fails immediately rather than being carried forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    #[error("divisibility of {0} exceeds the maximum of {1}")]
    Divisibility(u8, u8),
    #[error("rune name longer than the maximum of {0} letters")]
    NameLength(usize),
    #[error("premine plus maximum mint supply overflows u128")]
    SupplyOverflow,
    #[error("edict output {output} exceeds the transaction's {output_count} outputs")]
    EdictOutput { output: u32, output_count: u32 },
    #[error("symbol {0:?} is not representable")]
    Symbol(char),
    #[error("runestone script of {len} bytes exceeds the {max}-byte limit for a single OP_RETURN output")]
    PayloadTooLarge { len: usize, max: usize },
}
