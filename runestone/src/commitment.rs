//! Taproot commitment validation for reserved-name etchings (spec §4.J).
//!
//! Etching a brand-new rune name requires revealing, in a taproot
//! script-path spend among the etching transaction's inputs, a data push
//! equal to [`Rune::commitment`]. The spent output must also have matured
//! for [`COMMIT_CONFIRMATIONS`] blocks, so an etcher cannot both create and
//! spend the commitment within the same short window. This module takes its
//! view of previous outputs through [`PrevoutLookup`] so the crate itself
//! stays free of storage or RPC I/O.

use bitcoin::blockdata::script::Instruction;
use bitcoin::{OutPoint, ScriptBuf, Transaction};

use crate::rune::Rune;
use crate::runestone::COMMIT_CONFIRMATIONS;

/// Resolves a transaction input's previous output to the script it paid to
/// and the height at which that output was mined.
pub trait PrevoutLookup {
    fn prevout(&self, outpoint: &OutPoint) -> Option<(ScriptBuf, u32)>;
}

/// Whether any input of `tx` commits to `rune`, as required to etch it at
/// `height` (spec §4.J).
pub fn commits_to_rune(
    tx: &Transaction,
    rune: Rune,
    height: u32,
    prevouts: &impl PrevoutLookup,
) -> bool {
    let commitment = rune.commitment();

    tx.input.iter().any(|input| {
        let Some((script_pubkey, prevout_height)) = prevouts.prevout(&input.previous_output)
        else {
            return false;
        };

        if !script_pubkey.is_p2tr() {
            return false;
        }

        if height < prevout_height.saturating_add(COMMIT_CONFIRMATIONS) {
            return false;
        }

        let Some(tapscript) = input.witness.tapscript() else {
            return false;
        };

        tapscript.instructions().any(|instruction| {
            matches!(
                instruction,
                Ok(Instruction::PushBytes(push)) if push.as_bytes() == commitment.as_slice()
            )
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::blockdata::script::{Builder, PushBytesBuf};
    use bitcoin::{Amount, Sequence, TxIn, TxOut, Txid, Witness};
    use std::collections::HashMap;

    struct FakePrevouts(HashMap<OutPoint, (ScriptBuf, u32)>);

    impl PrevoutLookup for FakePrevouts {
        fn prevout(&self, outpoint: &OutPoint) -> Option<(ScriptBuf, u32)> {
            self.0.get(outpoint).cloned()
        }
    }

    fn commitment_script(rune: Rune) -> ScriptBuf {
        let push = PushBytesBuf::try_from(rune.commitment()).unwrap();
        Builder::new().push_slice(&push).into_script()
    }

    fn tapscript_spend(script: ScriptBuf) -> Witness {
        let mut witness = Witness::new();
        witness.push(script.as_bytes());
        // control block: leaf version + internal key, minimal valid shape
        // for `Witness::tapscript` to recognize a script-path spend.
        witness.push(vec![0xc0; 33]);
        witness
    }

    #[test]
    fn commitment_is_found_in_a_maturing_taproot_spend() {
        let rune = Rune(123_456);
        let commitment_script = commitment_script(rune);

        let outpoint = OutPoint::new(Txid::all_zeros(), 0);
        let prevout_script = bitcoin::ScriptBuf::new_p2tr_tweaked(
            bitcoin::key::TweakedPublicKey::dangerous_assume_tweaked(
                bitcoin::secp256k1::PublicKey::from_slice(&[
                    0x02, 0x79, 0xbe, 0x66, 0x7e, 0xf9, 0xdc, 0xbb, 0xac, 0x55, 0xa0, 0x62, 0x95,
                    0xce, 0x87, 0x0b, 0x07, 0x02, 0x9b, 0xfc, 0xdb, 0x2d, 0xce, 0x28, 0xd9, 0x59,
                    0xf2, 0x81, 0x5b, 0x16, 0xf8, 0x17, 0x98,
                ])
                .unwrap()
                .x_only_public_key()
                .0,
            ),
        );

        let tx = Transaction {
            version: bitcoin::transaction::Version::ONE,
            lock_time: bitcoin::absolute::LockTime::ZERO,
            input: vec![TxIn {
                previous_output: outpoint,
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: tapscript_spend(commitment_script),
            }],
            output: vec![TxOut {
                value: Amount::from_sat(0),
                script_pubkey: ScriptBuf::new(),
            }],
        };

        let mut prevouts = HashMap::new();
        prevouts.insert(outpoint, (prevout_script, 100));

        assert!(commits_to_rune(
            &tx,
            rune,
            100 + COMMIT_CONFIRMATIONS,
            &FakePrevouts(prevouts)
        ));
    }

    #[test]
    fn immature_commitment_does_not_count() {
        let rune = Rune(123_456);
        let commitment_script = commitment_script(rune);
        let outpoint = OutPoint::new(Txid::all_zeros(), 0);

        let tx = Transaction {
            version: bitcoin::transaction::Version::ONE,
            lock_time: bitcoin::absolute::LockTime::ZERO,
            input: vec![TxIn {
                previous_output: outpoint,
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: tapscript_spend(commitment_script),
            }],
            output: vec![TxOut {
                value: Amount::from_sat(0),
                script_pubkey: ScriptBuf::new(),
            }],
        };

        let mut prevouts = HashMap::new();
        prevouts.insert(outpoint, (ScriptBuf::new(), 100));

        assert!(!commits_to_rune(
            &tx,
            rune,
            100 + COMMIT_CONFIRMATIONS - 1,
            &FakePrevouts(prevouts)
        ));
    }
}
