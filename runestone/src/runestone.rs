//! The runestone message: script payload extraction, decoding into an
//! [`Artifact`], and encoding back into an `OP_RETURN` script (spec §4.D,
//! §4.E, §4.F, §4.G).

use bitcoin::blockdata::opcodes;
use bitcoin::blockdata::script::{Builder, Instruction, PushBytesBuf};
use bitcoin::{ScriptBuf, Transaction};

use crate::artifact::Artifact;
use crate::cenotaph::Cenotaph;
use crate::edict::Edict;
use crate::error::EncodeError;
use crate::etching::Etching;
use crate::flag::{self, Flag};
use crate::flaw::Flaw;
use crate::message::Message;
use crate::rune::Rune;
use crate::rune_id::RuneId;
use crate::tag::Tag;
use crate::terms::Terms;
use crate::varint;

/// Confirmations an etching's commitment must accrue before the rune it
/// names can be minted (spec §4.J).
pub const COMMIT_CONFIRMATIONS: u32 = 6;

/// Largest byte string a single script push may carry on mainnet policy.
const MAX_SCRIPT_ELEMENT_SIZE: usize = 520;

/// A successfully decoded runestone: the edicts, optional etching, and
/// pointer/mint instructions carried in a transaction's `OP_RETURN` output
/// (spec §3).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Runestone {
    pub edicts: Vec<Edict>,
    pub etching: Option<Etching>,
    pub mint: Option<RuneId>,
    pub pointer: Option<u32>,
}

impl Runestone {
    /// Extracts the runestone payload bytes from `tx`, if it carries a
    /// recognizable `OP_RETURN OP_13 <pushes...>` output (spec §4.D).
    /// `Ok(None)` means no output matches, so `tx` carries no runestone at
    /// all; `Err` means an output matched the prefix but its payload
    /// couldn't be read cleanly.
    fn payload(tx: &Transaction) -> Result<Option<Vec<u8>>, Flaw> {
        for output in &tx.output {
            let mut instructions = output.script_pubkey.instructions();

            match instructions.next() {
                Some(Ok(Instruction::Op(opcodes::all::OP_RETURN))) => {}
                _ => continue,
            }

            match instructions.next() {
                Some(Ok(Instruction::Op(opcodes::all::OP_PUSHNUM_13))) => {}
                _ => continue,
            }

            let mut payload = Vec::new();

            for instruction in instructions {
                match instruction {
                    Ok(Instruction::PushBytes(push)) => {
                        payload.extend_from_slice(push.as_bytes())
                    }
                    Ok(Instruction::Op(_)) => return Err(Flaw::Opcode),
                    Err(_) => return Err(Flaw::InvalidScript),
                }
            }

            return Ok(Some(payload));
        }

        Ok(None)
    }

    /// Decodes `tx`'s runestone payload, if any, into an [`Artifact`]. A
    /// transaction with no `OP_RETURN OP_13` output carries no runestone at
    /// all and yields `None`; every other outcome (valid or cenotaph) is
    /// `Some`.
    pub fn decipher(tx: &Transaction) -> Option<Artifact> {
        let payload = match Self::payload(tx) {
            Ok(Some(payload)) => payload,
            Ok(None) => return None,
            Err(flaw) => {
                return Some(Artifact::Cenotaph(Cenotaph {
                    flaws: [flaw].into_iter().collect(),
                    etching: None,
                    mint: None,
                }))
            }
        };

        let mut message = Message::from_payload(&payload);
        let mut flaws = std::mem::take(&mut message.flaws);

        let mut flags = message.take_flags();
        let etching_flag = Flag::Etching.take(&mut flags);
        let terms_flag = Flag::Terms.take(&mut flags);
        let turbo = Flag::Turbo.take(&mut flags);
        let cenotaph_flag = Flag::Cenotaph.take(&mut flags);

        if flag::has_unrecognized_flags(flags) {
            flaws.push(Flaw::UnrecognizedFlag);
        }

        for edict in &message.edicts {
            if edict.output as usize > tx.output.len() {
                flaws.push(Flaw::EdictOutput);
            }
        }

        let etching = if etching_flag {
            let divisibility = message
                .take_field(Tag::Divisibility)
                .and_then(|v| u8::try_from(v).ok());
            let premine = message.take_field(Tag::Premine);
            let rune = message.take_field(Tag::Rune).map(Rune);
            let spacers = message
                .take_field(Tag::Spacers)
                .and_then(|v| u32::try_from(v).ok());
            let symbol = message
                .take_field(Tag::Symbol)
                .and_then(|v| u32::try_from(v).ok())
                .and_then(char::from_u32);

            let terms = if terms_flag {
                Some(Terms {
                    amount: message.take_field(Tag::Amount),
                    cap: message.take_field(Tag::Cap),
                    height: (
                        message.take_field(Tag::HeightStart).and_then(|v| u64::try_from(v).ok()),
                        message.take_field(Tag::HeightEnd).and_then(|v| u64::try_from(v).ok()),
                    ),
                    offset: (
                        message.take_field(Tag::OffsetStart).and_then(|v| u64::try_from(v).ok()),
                        message.take_field(Tag::OffsetEnd).and_then(|v| u64::try_from(v).ok()),
                    ),
                })
            } else {
                None
            };

            let etching = Etching {
                divisibility,
                premine,
                rune,
                spacers,
                symbol,
                terms,
                turbo,
            };

            if !etching.is_valid_supply() {
                flaws.push(Flaw::SupplyOverflow);
            }

            Some(etching)
        } else {
            None
        };

        let mint_block = message.take_field(Tag::Mint);
        let mint_tx = message.take_field(Tag::Mint);

        let mint = match (mint_block, mint_tx) {
            (Some(block), Some(tx_index)) => match (u64::try_from(block), u32::try_from(tx_index)) {
                (Ok(block), Ok(tx_index)) => Some(RuneId::new(block, tx_index)),
                _ => {
                    flaws.push(Flaw::EdictRuneId);
                    None
                }
            },
            _ => None,
        };

        let pointer = message
            .take_field(Tag::Pointer)
            .and_then(|v| u32::try_from(v).ok());

        if let Some(p) = pointer {
            if p as usize >= tx.output.len() {
                flaws.push(Flaw::EdictOutput);
            }
        }

        let pointer = pointer.filter(|&p| (p as usize) < tx.output.len());

        let force_cenotaph = cenotaph_flag || message.fields.contains_key(&Tag::Cenotaph);

        if force_cenotaph || !flaws.is_empty() {
            return Some(Artifact::Cenotaph(Cenotaph {
                flaws: flaws.into_iter().collect(),
                etching: etching.and_then(|e| e.rune),
                mint,
            }));
        }

        Some(Artifact::Runestone(Runestone {
            edicts: message.edicts,
            etching,
            mint,
            pointer,
        }))
    }

    /// Checks every edict's `output` and the `pointer`, if set, against a
    /// transaction with `output_count` outputs (spec §7's `EdictOutput`
    /// encoding error). Separate from [`encipher`](Self::encipher) because
    /// a `Runestone` can be built and inspected before the transaction
    /// that will carry it is finalized.
    pub fn validate_outputs(&self, output_count: u32) -> Result<(), EncodeError> {
        for edict in &self.edicts {
            if edict.output > output_count {
                return Err(EncodeError::EdictOutput {
                    output: edict.output,
                    output_count,
                });
            }
        }

        if let Some(pointer) = self.pointer {
            if pointer >= output_count {
                return Err(EncodeError::EdictOutput {
                    output: pointer,
                    output_count,
                });
            }
        }

        Ok(())
    }

    /// Encodes this runestone into an `OP_RETURN OP_13 <pushes...>` script
    /// (spec §4.G), splitting the payload across pushes no larger than
    /// [`MAX_SCRIPT_ELEMENT_SIZE`].
    pub fn encipher(&self) -> ScriptBuf {
        let mut payload = Vec::new();

        let mut flags = 0u128;
        if let Some(etching) = &self.etching {
            Flag::Etching.set(&mut flags);

            if etching.terms.is_some() {
                Flag::Terms.set(&mut flags);
            }

            if etching.turbo {
                Flag::Turbo.set(&mut flags);
            }
        }

        if flags != 0 {
            varint::encode_to_vec(Tag::Flags.value(), &mut payload);
            varint::encode_to_vec(flags, &mut payload);
        }

        if let Some(etching) = &self.etching {
            if let Some(rune) = etching.rune {
                varint::encode_to_vec(Tag::Rune.value(), &mut payload);
                varint::encode_to_vec(rune.n(), &mut payload);
            }

            if let Some(divisibility) = etching.divisibility {
                varint::encode_to_vec(Tag::Divisibility.value(), &mut payload);
                varint::encode_to_vec(u128::from(divisibility), &mut payload);
            }

            if let Some(spacers) = etching.spacers {
                varint::encode_to_vec(Tag::Spacers.value(), &mut payload);
                varint::encode_to_vec(u128::from(spacers), &mut payload);
            }

            if let Some(symbol) = etching.symbol {
                varint::encode_to_vec(Tag::Symbol.value(), &mut payload);
                varint::encode_to_vec(u128::from(symbol as u32), &mut payload);
            }

            if let Some(premine) = etching.premine {
                varint::encode_to_vec(Tag::Premine.value(), &mut payload);
                varint::encode_to_vec(premine, &mut payload);
            }

            if let Some(terms) = etching.terms {
                if let Some(amount) = terms.amount {
                    varint::encode_to_vec(Tag::Amount.value(), &mut payload);
                    varint::encode_to_vec(amount, &mut payload);
                }

                if let Some(cap) = terms.cap {
                    varint::encode_to_vec(Tag::Cap.value(), &mut payload);
                    varint::encode_to_vec(cap, &mut payload);
                }

                if let Some(start) = terms.height.0 {
                    varint::encode_to_vec(Tag::HeightStart.value(), &mut payload);
                    varint::encode_to_vec(u128::from(start), &mut payload);
                }

                if let Some(end) = terms.height.1 {
                    varint::encode_to_vec(Tag::HeightEnd.value(), &mut payload);
                    varint::encode_to_vec(u128::from(end), &mut payload);
                }

                if let Some(start) = terms.offset.0 {
                    varint::encode_to_vec(Tag::OffsetStart.value(), &mut payload);
                    varint::encode_to_vec(u128::from(start), &mut payload);
                }

                if let Some(end) = terms.offset.1 {
                    varint::encode_to_vec(Tag::OffsetEnd.value(), &mut payload);
                    varint::encode_to_vec(u128::from(end), &mut payload);
                }
            }
        }

        if let Some(mint) = self.mint {
            varint::encode_to_vec(Tag::Mint.value(), &mut payload);
            varint::encode_to_vec(u128::from(mint.block), &mut payload);
            varint::encode_to_vec(Tag::Mint.value(), &mut payload);
            varint::encode_to_vec(u128::from(mint.tx), &mut payload);
        }

        if let Some(pointer) = self.pointer {
            varint::encode_to_vec(Tag::Pointer.value(), &mut payload);
            varint::encode_to_vec(u128::from(pointer), &mut payload);
        }

        if !self.edicts.is_empty() {
            varint::encode_to_vec(Tag::Body.value(), &mut payload);

            let mut edicts = self.edicts.clone();
            edicts.sort_by_key(|edict| edict.id);

            let mut previous = RuneId::new(0, 0);

            for edict in edicts {
                let (block_delta, tx_delta) = previous
                    .delta(edict.id)
                    .expect("edicts are sorted ascending by id");

                varint::encode_to_vec(block_delta, &mut payload);
                varint::encode_to_vec(tx_delta, &mut payload);
                varint::encode_to_vec(edict.amount, &mut payload);
                varint::encode_to_vec(u128::from(edict.output), &mut payload);

                previous = edict.id;
            }
        }

        let mut builder = Builder::new()
            .push_opcode(opcodes::all::OP_RETURN)
            .push_opcode(opcodes::all::OP_PUSHNUM_13);

        for chunk in payload.chunks(MAX_SCRIPT_ELEMENT_SIZE) {
            let push = PushBytesBuf::try_from(chunk.to_vec())
                .expect("chunk respects the script push-size limit");
            builder = builder.push_slice(&push);
        }

        builder.into_script()
    }
}
