//! The storage-facing half of the ledger state machine (spec §4.I):
//! resolves a transaction's inputs and rune lookups from [`Storage`],
//! invokes `runestone::ledger`'s pure fold, and persists the result.
//! Grounded on `RunesIndexer::_index_transaction`
//! (`orbtc/src/indexer/runes_indexer.rs`), generalized from its
//! Postgres-specific repository calls to the `Storage` trait.

use std::collections::BTreeMap;

use bitcoin::{Network, Transaction};
use log::{debug, warn};
use runestone::commitment::commits_to_rune;
use runestone::ledger::{self, LedgerView, TxContext};
use runestone::{Rune, RuneEntry, RuneId};

use crate::rpc::{BitcoinRpc, RpcPrevoutLookup};
use crate::storage::{Storage, StorageError};

/// Adapts a live [`Storage`] into `runestone::ledger`'s read-only view,
/// so the pure fold never needs to know it's backed by a database (spec
/// §9's "indirection by RuneId" design note).
struct StorageView<'a, S: Storage> {
    storage: &'a S,
}

impl<S: Storage> LedgerView for StorageView<'_, S> {
    fn get_rune_entry(&self, id: RuneId) -> Option<RuneEntry> {
        self.storage.get_rune_entry(id).ok().flatten()
    }

    fn get_rune_id_by_name(&self, rune: Rune) -> Option<RuneId> {
        self.storage
            .get_rune_entry_by_name(rune)
            .ok()
            .flatten()
            .map(|entry| entry.rune_id)
    }
}

/// Folds and persists one transaction's rune effects (spec §4.I). Skips
/// entirely before the network's rune activation height and for coinbase
/// transactions, matching `RunesIndexer::index_transaction`'s own gate.
pub fn apply_transaction(
    storage: &mut impl Storage,
    rpc: &impl BitcoinRpc,
    network: Network,
    height: u64,
    tx_index: u32,
    tx: &Transaction,
) -> Result<(), StorageError> {
    if (Rune::first_rune_height(network) as u64) > height {
        return Ok(());
    }

    if tx.is_coinbase() {
        return Ok(());
    }

    let artifact = match runestone::decode(tx) {
        Some(artifact) => artifact,
        None => {
            pass_through(storage, tx)?;
            return Ok(());
        }
    };

    let mut input_balances: BTreeMap<RuneId, u128> = BTreeMap::new();

    for input in &tx.input {
        let balances = storage.get_utxo_balances(input.previous_output.txid, input.previous_output.vout)?;

        for (id, amount) in balances {
            *input_balances.entry(id).or_default() += amount;
        }

        storage.delete_utxo_balances(input.previous_output.txid, input.previous_output.vout)?;
    }

    let has_valid_commitment = artifact
        .as_runestone()
        .and_then(|runestone| runestone.etching.as_ref())
        .and_then(|etching| etching.rune)
        .map(|rune| {
            let prevouts = RpcPrevoutLookup { rpc };
            commits_to_rune(tx, rune, height as u32, &prevouts)
        })
        .unwrap_or(false);

    let context = TxContext::from_transaction(network, height, tx_index, tx, has_valid_commitment);
    let view = StorageView { storage };
    let effects = ledger::apply_transaction(&artifact, &context, input_balances, &view);

    if let Some((id, entry)) = &effects.etched {
        debug!("etched rune {} at {id}", entry.rune);
        storage.set_rune_entry(*id, entry.clone())?;
    }

    if let Some((id, entry)) = &effects.minted {
        debug!("minted rune {id}: mints now {}", entry.mints);
        storage.set_rune_entry(*id, entry.clone())?;
    }

    for (id, amount) in &effects.burned {
        if *amount > 0 {
            storage.add_burned(*id, *amount)?;
        }
    }

    let txid = tx.compute_txid();

    for (vout, balances) in effects.output_balances.into_iter().enumerate() {
        if balances.is_empty() {
            continue;
        }

        let balances: Vec<(RuneId, u128)> = balances.into_iter().collect();
        storage.set_utxo_balances(txid, vout as u32, balances)?;
    }

    if !effects.burned.is_empty() {
        warn!(
            "tx {txid} burned {} rune(s) at height {height}",
            effects.burned.len()
        );
    }

    Ok(())
}

/// With no runestone output at all, every input balance flows unchanged
/// to the first non-`OP_RETURN` output, or is burned if there is none
/// (spec §4.I step 7).
fn pass_through(storage: &mut impl Storage, tx: &Transaction) -> Result<(), StorageError> {
    let mut unallocated: BTreeMap<RuneId, u128> = BTreeMap::new();

    for input in &tx.input {
        let balances = storage.get_utxo_balances(input.previous_output.txid, input.previous_output.vout)?;

        for (id, amount) in balances {
            *unallocated.entry(id).or_default() += amount;
        }

        storage.delete_utxo_balances(input.previous_output.txid, input.previous_output.vout)?;
    }

    if unallocated.is_empty() {
        return Ok(());
    }

    let target = tx
        .output
        .iter()
        .position(|out| !out.script_pubkey.is_op_return());

    let txid = tx.compute_txid();

    match target {
        Some(vout) => {
            storage.set_utxo_balances(txid, vout as u32, unallocated.into_iter().collect())?;
        }
        None => {
            for (id, amount) in unallocated {
                storage.add_burned(id, amount)?;
            }
        }
    }

    Ok(())
}
