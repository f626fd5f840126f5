//! Wire-level codec and validation rules for the Runes fungible-token
//! protocol layered on Bitcoin.
//!
//! This crate owns the protocol engine only: decoding a transaction's
//! output scripts into a [`Runestone`] or [`Cenotaph`], encoding a
//! `Runestone` back to script bytes, and folding a decoded artifact into a
//! transaction's rune balance changes ([`ledger`]). It performs no I/O;
//! callers that walk a real Bitcoin chain (storage, RPC, the block-walking
//! loop) live in the `runestone-indexer` crate.

pub mod artifact;
pub mod cenotaph;
pub mod commitment;
pub mod edict;
pub mod error;
pub mod etching;
pub mod flag;
pub mod flaw;
pub mod ledger;
pub mod message;
pub mod rune;
pub mod rune_entry;
pub mod rune_id;
pub mod runestone;
pub mod spaced_rune;
pub mod tag;
pub mod terms;
pub mod varint;

pub use artifact::Artifact;
pub use cenotaph::Cenotaph;
pub use edict::Edict;
pub use error::EncodeError;
pub use etching::{Etching, MAX_DIVISIBILITY};
pub use flaw::Flaw;
pub use rune::{Rune, MAX_NAME_LENGTH};
pub use rune_entry::RuneEntry;
pub use rune_id::RuneId;
pub use runestone::{Runestone, COMMIT_CONFIRMATIONS};
pub use spaced_rune::SpacedRune;
pub use terms::Terms;

use bitcoin::{ScriptBuf, Transaction};

/// Largest a runestone's `OP_RETURN` script may be: bitcoin's consensus
/// script-size limit. An etching/edict set that encodes past this cannot
/// be carried in a single runestone output at all, so [`encode`] refuses
/// it rather than silently truncating (spec §4.G, §7).
pub const MAX_RUNESTONE_SCRIPT_SIZE: usize = 10_000;

/// Builds and validates a runestone's wire encoding (spec §4.G, §6, §7).
/// Returns the `OP_RETURN` script and, if the runestone etches a named
/// rune, the commitment bytes the etcher's taproot reveal must carry (spec
/// §4.J). Refuses exactly the mistakes §7 enumerates as the caller's own:
/// no partial output is ever returned.
///
/// This does not check edict/pointer output indices against a transaction,
/// since a `Runestone` can be constructed before the transaction that will
/// carry it is finalized; call [`Runestone::validate_outputs`] once the
/// output count is known.
pub fn encode(runestone: &Runestone) -> Result<(ScriptBuf, Option<Vec<u8>>), EncodeError> {
    validate(runestone)?;

    let script = runestone.encipher();

    if script.len() > MAX_RUNESTONE_SCRIPT_SIZE {
        return Err(EncodeError::PayloadTooLarge {
            len: script.len(),
            max: MAX_RUNESTONE_SCRIPT_SIZE,
        });
    }

    let commitment = runestone
        .etching
        .as_ref()
        .and_then(|etching| etching.rune)
        .map(Rune::commitment);

    Ok((script, commitment))
}

fn validate(runestone: &Runestone) -> Result<(), EncodeError> {
    if let Some(etching) = &runestone.etching {
        if let Some(divisibility) = etching.divisibility {
            if divisibility > MAX_DIVISIBILITY {
                return Err(EncodeError::Divisibility(divisibility, MAX_DIVISIBILITY));
            }
        }

        if let Some(rune) = etching.rune {
            let len = rune.to_string().len();
            if len > MAX_NAME_LENGTH {
                return Err(EncodeError::NameLength(len));
            }
        }

        if !etching.is_valid_supply() {
            return Err(EncodeError::SupplyOverflow);
        }
    }

    Ok(())
}

/// Decodes `tx`'s runestone payload, if any (spec §4.D–§4.F, §6).
///
/// - `None` — `tx` carries no `OP_RETURN OP_13` output at all.
/// - `Some(Artifact::Runestone(_))` — a well-formed message.
/// - `Some(Artifact::Cenotaph(_))` — a malformed message that still has
///   on-chain effects (spec §3).
pub fn decode(tx: &Transaction) -> Option<Artifact> {
    Runestone::decipher(tx)
}
