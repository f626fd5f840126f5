//! The per-transaction ledger fold (spec §4.I): turns a deciphered
//! [`Artifact`] plus the aggregated rune balances an input set carries into
//! a new distribution across the transaction's outputs. Pure and
//! I/O-free — callers supply rune lookups through [`LedgerView`] and commit
//! the returned [`TxEffects`] to storage themselves.

use std::collections::{BTreeMap, BTreeSet};

use crate::artifact::Artifact;
use crate::etching::Etching;
use crate::flaw::Flaw;
use crate::rune::Rune;
use crate::rune_entry::RuneEntry;
use crate::rune_id::RuneId;

/// Read access to already-confirmed rune state, needed to validate mints
/// and name reservations while folding a new transaction.
pub trait LedgerView {
    fn get_rune_entry(&self, id: RuneId) -> Option<RuneEntry>;
    fn get_rune_id_by_name(&self, rune: Rune) -> Option<RuneId>;
}

/// Everything about the transaction being folded that the ledger can't
/// derive from the artifact alone.
pub struct TxContext {
    /// Network the transaction was indexed on, needed to evaluate the
    /// height-indexed minimum-name-length schedule.
    pub network: bitcoin::Network,
    pub height: u64,
    pub tx_index: u32,
    pub output_count: u32,
    /// Indices of outputs whose script is `OP_RETURN`. Both the pro-rata
    /// edict split and the unallocated-balance sweep exclude these (spec
    /// §4.I step 4, step 5).
    pub op_return_outputs: BTreeSet<u32>,
    /// Whether a taproot input of this transaction commits to the
    /// etching's rune name, as required by [`commitment::commits_to_rune`](crate::commitment::commits_to_rune).
    /// Irrelevant, and ignored, when the etching assigns no explicit name.
    pub has_valid_commitment: bool,
}

impl TxContext {
    /// Builds the context directly from the transaction being indexed,
    /// scanning its outputs for `OP_RETURN` once so the fold itself never
    /// has to touch script bytes.
    pub fn from_transaction(
        network: bitcoin::Network,
        height: u64,
        tx_index: u32,
        tx: &bitcoin::Transaction,
        has_valid_commitment: bool,
    ) -> Self {
        let op_return_outputs = tx
            .output
            .iter()
            .enumerate()
            .filter_map(|(i, out)| out.script_pubkey.is_op_return().then_some(i as u32))
            .collect();

        Self {
            network,
            height,
            tx_index,
            output_count: tx.output.len() as u32,
            op_return_outputs,
            has_valid_commitment,
        }
    }

    /// Index of the first output that isn't `OP_RETURN`, the default sweep
    /// target when a runestone sets no `pointer` (spec §4.I). `None` if
    /// every output is `OP_RETURN`.
    pub fn first_non_op_return_output(&self) -> Option<u32> {
        (0..self.output_count).find(|i| !self.op_return_outputs.contains(i))
    }
}

/// Balance changes produced by folding one transaction.
#[derive(Debug, Default)]
pub struct TxEffects {
    pub output_balances: Vec<BTreeMap<RuneId, u128>>,
    pub etched: Option<(RuneId, RuneEntry)>,
    /// The rune minted this transaction, and its ledger entry with `mints`
    /// incremented, for the caller to persist. Distinct from `etched`: a
    /// mint always targets a rune that already exists.
    pub minted: Option<(RuneId, RuneEntry)>,
    pub burned: BTreeMap<RuneId, u128>,
}

/// Folds one transaction's runes: validates any etching and mint, applies
/// edicts, and sweeps unallocated balances, per the order of operations in
/// spec §4.I.
pub fn apply_transaction(
    artifact: &Artifact,
    context: &TxContext,
    mut input_balances: BTreeMap<RuneId, u128>,
    view: &impl LedgerView,
) -> TxEffects {
    let mut effects = TxEffects {
        output_balances: vec![BTreeMap::new(); context.output_count as usize],
        ..TxEffects::default()
    };

    let cenotaph = match artifact {
        Artifact::Cenotaph(cenotaph) => Some(cenotaph),
        Artifact::Runestone(_) => None,
    };

    if let Some(cenotaph) = cenotaph {
        // every input rune is burned outright, including anything a
        // pending mint would otherwise have credited.
        for (id, amount) in input_balances {
            *effects.burned.entry(id).or_default() += amount;
        }

        if let Some(mint_id) = cenotaph.mint {
            if let Some(mut entry) = view.get_rune_entry(mint_id) {
                if entry.mint_is_open(context.height) {
                    let amount = entry.mint_amount();
                    entry.mints += 1;
                    *effects.burned.entry(mint_id).or_default() += amount;
                    effects.minted = Some((mint_id, entry));
                }
            }
        }

        return effects;
    }

    let Artifact::Runestone(runestone) = artifact else {
        unreachable!("cenotaph handled above")
    };

    let etched_id = RuneId::new(context.height, context.tx_index);

    let etched = runestone
        .etching
        .as_ref()
        .and_then(|etching| validate_etching(etching, etched_id, context, view));

    if let Some((_, entry)) = &etched {
        if entry.premine > 0 {
            *input_balances.entry(etched_id).or_default() += entry.premine;
        }

        effects.etched = Some((etched_id, entry.clone()));
    }

    if let Some(requested) = runestone.mint {
        if let Some(mut entry) = view.get_rune_entry(requested) {
            if entry.mint_is_open(context.height) {
                let amount = entry.mint_amount();
                *input_balances.entry(requested).or_default() += amount;
                entry.mints += 1;
                effects.minted = Some((requested, entry));
            }
        }
    }

    for edict in &runestone.edicts {
        let id = if edict.id == RuneId::new(0, 0) {
            match etched_id_if_etched(&etched) {
                Some(id) => id,
                None => continue,
            }
        } else {
            edict.id
        };

        let available = input_balances.get(&id).copied().unwrap_or(0);

        if available == 0 {
            continue;
        }

        let amount = if edict.amount == 0 {
            available
        } else {
            edict.amount.min(available)
        };

        if edict.output == context.output_count {
            distribute_across_all_outputs(
                &mut effects,
                id,
                amount,
                context.output_count,
                &context.op_return_outputs,
            );
        } else {
            *effects.output_balances[edict.output as usize]
                .entry(id)
                .or_default() += amount;
        }

        *input_balances.get_mut(&id).expect("checked above") -= amount;
    }

    // sweep whatever's left to the pointer, or the first non-OP_RETURN
    // output, or burn it if neither exists.
    for (id, remaining) in input_balances {
        if remaining == 0 {
            continue;
        }

        let target = runestone
            .pointer
            .filter(|&p| p < context.output_count)
            .or_else(|| context.first_non_op_return_output());

        match target {
            Some(output) => {
                *effects.output_balances[output as usize]
                    .entry(id)
                    .or_default() += remaining;
            }
            None => {
                *effects.burned.entry(id).or_default() += remaining;
            }
        }
    }

    effects
}

fn etched_id_if_etched(etched: &Option<(RuneId, RuneEntry)>) -> Option<RuneId> {
    etched.as_ref().map(|(id, _)| *id)
}

/// Splits `amount` of rune `id` evenly across every non-`OP_RETURN` output,
/// crediting the remainder of the division to the earliest eligible
/// outputs first (spec §4.I step 4, §9: canonical pro-rata remainder
/// policy). An `amount` of zero credits nothing, matching the "amount == 0
/// and no remaining balance" case callers guard against before calling in.
fn distribute_across_all_outputs(
    effects: &mut TxEffects,
    id: RuneId,
    amount: u128,
    output_count: u32,
    op_return_outputs: &BTreeSet<u32>,
) {
    let destinations: Vec<u32> = (0..output_count)
        .filter(|i| !op_return_outputs.contains(i))
        .collect();

    if destinations.is_empty() {
        return;
    }

    let share = amount / u128::from(destinations.len() as u32);
    let mut remainder = amount % u128::from(destinations.len() as u32);

    for output in destinations {
        let mut credit = share;

        if remainder > 0 {
            credit += 1;
            remainder -= 1;
        }

        if credit > 0 {
            *effects.output_balances[output as usize].entry(id).or_default() += credit;
        }
    }
}

/// Validates a declared etching against the naming and commitment rules
/// (spec §4.I, §4.J), returning the ledger entry to create if it passes.
/// An etching that fails validation is simply not created: it credits no
/// premine and authorizes no mint, but the transaction's edicts and other
/// effects still apply.
fn validate_etching(
    etching: &Etching,
    etched_id: RuneId,
    context: &TxContext,
    view: &impl LedgerView,
) -> Option<(RuneId, RuneEntry)> {
    let rune = match etching.rune {
        Some(rune) => {
            if rune.is_reserved() {
                return None;
            }

            if name_meets_minimum_length(rune, context.network, context.height as u32).is_err() {
                return None;
            }

            if view.get_rune_id_by_name(rune).is_some() {
                return None;
            }

            if !context.has_valid_commitment {
                return None;
            }

            rune
        }
        None => Rune::reserved(context.height, context.tx_index),
    };

    Some((
        etched_id,
        RuneEntry::from_etching(etched_id, etching, rune, context.height),
    ))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("rune name below the minimum length for its etching height")]
pub struct NameTooShort;

/// Checks the etching's name against the height-indexed minimum length
/// schedule (spec §4.B), separate from [`validate_etching`] so callers can
/// surface it as a distinct rejection reason.
pub fn name_meets_minimum_length(rune: Rune, network: bitcoin::Network, height: u32) -> Result<(), NameTooShort> {
    if rune.0 < crate::rune::Rune::minimum_at_height(network, height).0 {
        return Err(NameTooShort);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FakeView(HashMap<RuneId, RuneEntry>, HashMap<Rune, RuneId>);

    impl LedgerView for FakeView {
        fn get_rune_entry(&self, id: RuneId) -> Option<RuneEntry> {
            self.0.get(&id).cloned()
        }

        fn get_rune_id_by_name(&self, rune: Rune) -> Option<RuneId> {
            self.1.get(&rune).copied()
        }
    }

    fn context(output_count: u32) -> TxContext {
        TxContext {
            network: bitcoin::Network::Bitcoin,
            height: 840_000,
            tx_index: 1,
            output_count,
            op_return_outputs: BTreeSet::new(),
            has_valid_commitment: true,
        }
    }

    #[test]
    fn cenotaph_burns_every_input_rune() {
        let id = RuneId::new(1, 1);
        let mut input_balances = BTreeMap::new();
        input_balances.insert(id, 500);

        let artifact = Artifact::Cenotaph(crate::cenotaph::Cenotaph {
            flaws: [Flaw::UnrecognizedEvenTag].into_iter().collect(),
            etching: None,
            mint: None,
        });

        let view = FakeView(HashMap::new(), HashMap::new());
        let effects = apply_transaction(&artifact, &context(2), input_balances.clone(), &view);

        assert_eq!(effects.burned.get(&id), Some(&500));
        assert!(effects.output_balances.iter().all(BTreeMap::is_empty));
    }

    #[test]
    fn edict_with_zero_amount_sweeps_all_available_to_one_output() {
        use crate::edict::Edict;
        use crate::runestone::Runestone;

        let id = RuneId::new(1, 1);
        let mut input_balances = BTreeMap::new();
        input_balances.insert(id, 300);

        let artifact = Artifact::Runestone(Runestone {
            edicts: vec![Edict {
                id,
                amount: 0,
                output: 1,
            }],
            etching: None,
            mint: None,
            pointer: None,
        });

        let view = FakeView(HashMap::new(), HashMap::new());
        let effects = apply_transaction(&artifact, &context(2), input_balances, &view);

        assert_eq!(effects.output_balances[1].get(&id), Some(&300));
        assert!(effects.output_balances[0].is_empty());
    }

    #[test]
    fn unallocated_balance_sweeps_to_the_pointer() {
        use crate::runestone::Runestone;

        let id = RuneId::new(1, 1);
        let mut input_balances = BTreeMap::new();
        input_balances.insert(id, 50);

        let artifact = Artifact::Runestone(Runestone {
            edicts: vec![],
            etching: None,
            mint: None,
            pointer: Some(1),
        });

        let view = FakeView(HashMap::new(), HashMap::new());
        let effects = apply_transaction(&artifact, &context(2), input_balances, &view);

        assert_eq!(effects.output_balances[1].get(&id), Some(&50));
    }

    #[test]
    fn split_edict_distributes_remainder_to_earliest_outputs() {
        use crate::edict::Edict;
        use crate::runestone::Runestone;

        let id = RuneId::new(1, 1);
        let mut input_balances = BTreeMap::new();
        input_balances.insert(id, 10);

        let artifact = Artifact::Runestone(Runestone {
            edicts: vec![Edict {
                id,
                amount: 0,
                output: 3,
            }],
            etching: None,
            mint: None,
            pointer: None,
        });

        let view = FakeView(HashMap::new(), HashMap::new());
        let effects = apply_transaction(&artifact, &context(3), input_balances, &view);

        assert_eq!(effects.output_balances[0].get(&id), Some(&4));
        assert_eq!(effects.output_balances[1].get(&id), Some(&3));
        assert_eq!(effects.output_balances[2].get(&id), Some(&3));
    }

    #[test]
    fn split_edict_skips_op_return_outputs() {
        use crate::edict::Edict;
        use crate::runestone::Runestone;

        let id = RuneId::new(1, 1);
        let mut input_balances = BTreeMap::new();
        input_balances.insert(id, 10);

        let artifact = Artifact::Runestone(Runestone {
            edicts: vec![Edict {
                id,
                amount: 0,
                output: 3,
            }],
            etching: None,
            mint: None,
            pointer: None,
        });

        let mut context = context(3);
        context.op_return_outputs.insert(1);

        let view = FakeView(HashMap::new(), HashMap::new());
        let effects = apply_transaction(&artifact, &context, input_balances, &view);

        assert_eq!(effects.output_balances[0].get(&id), Some(&5));
        assert!(effects.output_balances[1].is_empty());
        assert_eq!(effects.output_balances[2].get(&id), Some(&5));
    }

    #[test]
    fn sweep_falls_back_to_first_non_op_return_output() {
        use crate::runestone::Runestone;

        let id = RuneId::new(1, 1);
        let mut input_balances = BTreeMap::new();
        input_balances.insert(id, 50);

        let artifact = Artifact::Runestone(Runestone::default());

        let mut context = context(2);
        context.op_return_outputs.insert(0);

        let view = FakeView(HashMap::new(), HashMap::new());
        let effects = apply_transaction(&artifact, &context, input_balances, &view);

        assert!(effects.output_balances[0].is_empty());
        assert_eq!(effects.output_balances[1].get(&id), Some(&50));
    }

    #[test]
    fn etching_with_too_short_name_is_not_created() {
        use crate::runestone::Runestone;

        // far below the 13-letter minimum required at height 840_000.
        let short_rune = Rune(123_456);

        let artifact = Artifact::Runestone(Runestone {
            edicts: vec![],
            etching: Some(Etching {
                rune: Some(short_rune),
                premine: Some(100),
                ..Default::default()
            }),
            mint: None,
            pointer: None,
        });

        let view = FakeView(HashMap::new(), HashMap::new());
        let effects = apply_transaction(&artifact, &context(1), BTreeMap::new(), &view);

        assert!(effects.etched.is_none());
        assert!(effects.output_balances.iter().all(BTreeMap::is_empty));
    }

    #[test]
    fn pro_rata_edict_distributes_only_the_requested_amount() {
        use crate::edict::Edict;
        use crate::runestone::Runestone;

        let id = RuneId::new(1, 1);
        let mut input_balances = BTreeMap::new();
        input_balances.insert(id, 10);

        let artifact = Artifact::Runestone(Runestone {
            edicts: vec![Edict {
                id,
                amount: 6,
                output: 3,
            }],
            etching: None,
            mint: None,
            pointer: Some(0),
        });

        let view = FakeView(HashMap::new(), HashMap::new());
        let effects = apply_transaction(&artifact, &context(3), input_balances, &view);

        assert_eq!(effects.output_balances[0].get(&id), Some(&(2 + 4)));
        assert_eq!(effects.output_balances[1].get(&id), Some(&2));
        assert_eq!(effects.output_balances[2].get(&id), Some(&2));
    }

    #[test]
    fn sweep_burns_when_every_output_is_op_return() {
        use crate::runestone::Runestone;

        let id = RuneId::new(1, 1);
        let mut input_balances = BTreeMap::new();
        input_balances.insert(id, 50);

        let artifact = Artifact::Runestone(Runestone::default());

        let mut context = context(1);
        context.op_return_outputs.insert(0);

        let view = FakeView(HashMap::new(), HashMap::new());
        let effects = apply_transaction(&artifact, &context, input_balances, &view);

        assert_eq!(effects.burned.get(&id), Some(&50));
    }
}
