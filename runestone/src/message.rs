//! Splits a runestone's integer payload into its body (edicts) and its tag
//! keyed fields (spec §4.E).

use std::collections::HashMap;

use crate::edict::Edict;
use crate::flaw::Flaw;
use crate::rune_id::RuneId;
use crate::tag::Tag;
use crate::varint;

/// The result of walking a runestone payload's integer sequence: edicts
/// parsed from the body, and every recognized tag's pushed values in
/// encounter order. Unrecognized odd tags are dropped silently; an
/// unrecognized even tag or a malformed edict run is reported as a flaw but
/// does not stop the walk, so later fields are still recovered for display.
pub struct Message {
    pub edicts: Vec<Edict>,
    pub fields: HashMap<Tag, Vec<u128>>,
    pub flaws: Vec<Flaw>,
}

impl Message {
    /// Parses every integer in `integers`, consuming the `Body` run (an
    /// initial `RuneId` followed by zero or more `(block_delta, tx_delta,
    /// amount, output)` quads) and then alternating `(tag, value)` pairs
    /// for everything after it.
    pub fn from_integers(integers: &[u128]) -> Self {
        let mut edicts = Vec::new();
        let mut fields: HashMap<Tag, Vec<u128>> = HashMap::new();
        let mut flaws = Vec::new();

        let mut i = 0;

        while i < integers.len() {
            let tag_value = integers[i];

            if Tag::from_value(tag_value) == Some(Tag::Body) {
                i += 1;

                let mut id = RuneId::new(0, 0);

                while i < integers.len() {
                    let Some(chunk) = integers.get(i..i + 4) else {
                        flaws.push(Flaw::TrailingIntegers);
                        break;
                    };

                    match id.apply_delta(chunk[0], chunk[1]) {
                        Ok(next_id) => id = next_id,
                        Err(flaw) => {
                            flaws.push(flaw);
                            i += 4;
                            continue;
                        }
                    }

                    edicts.push(Edict {
                        id,
                        amount: chunk[2],
                        output: match u32::try_from(chunk[3]) {
                            Ok(output) => output,
                            Err(_) => {
                                flaws.push(Flaw::EdictOutput);
                                i += 4;
                                continue;
                            }
                        },
                    });

                    i += 4;
                }

                break;
            }

            let Some(&value) = integers.get(i + 1) else {
                flaws.push(Flaw::TruncatedField);
                break;
            };

            match Tag::from_value(tag_value) {
                Some(tag) => {
                    fields.entry(tag).or_default().push(value);
                }
                None if Tag::is_even(tag_value) => {
                    flaws.push(Flaw::UnrecognizedEvenTag);
                }
                None => {
                    // unrecognized odd tag: ignored for forward compatibility.
                }
            }

            i += 2;
        }

        Self {
            edicts,
            fields,
            flaws,
        }
    }

    /// Decodes the raw payload bytes into the flat integer sequence
    /// [`from_integers`](Self::from_integers) expects, recording a
    /// [`Flaw::Varint`] and stopping at the first malformed varint.
    pub fn from_payload(payload: &[u8]) -> Self {
        let mut integers = Vec::new();
        let mut cursor = 0;
        let mut varint_flaw = false;

        while cursor < payload.len() {
            match varint::decode(&payload[cursor..]) {
                Ok((value, consumed)) => {
                    integers.push(value);
                    cursor += consumed;
                }
                Err(_) => {
                    varint_flaw = true;
                    break;
                }
            }
        }

        let mut message = Self::from_integers(&integers);

        if varint_flaw {
            message.flaws.push(Flaw::Varint);
        }

        message
    }

    pub fn take_field(&mut self, tag: Tag) -> Option<u128> {
        self.fields.get_mut(&tag).and_then(|values| {
            if values.is_empty() {
                None
            } else {
                Some(values.remove(0))
            }
        })
    }

    pub fn take_flags(&mut self) -> u128 {
        self.fields.remove(&Tag::Flags).map_or(0, |values| {
            values.into_iter().fold(0u128, |acc, v| acc | v)
        })
    }
}
