//! The persistence boundary (spec §6): every operation the ledger
//! orchestration needs from a key/value or SQL backend, kept as a trait so
//! the indexer core never depends on a concrete database. [`MemoryStorage`]
//! is the crate's own reference implementation — used by its tests and
//! fine for small or ephemeral deployments; a production backend is out of
//! this spec's scope (spec §1), so no second implementation lives here.

use std::collections::{BTreeMap, HashMap};

use bitcoin::{BlockHash, Txid};
use runestone::{Rune, RuneEntry, RuneId};

/// A persistence failure. `MemoryStorage` never produces one — it exists
/// for trait conformance with backends that can fail (disk full, network
/// partition, constraint violation).
#[derive(Debug, thiserror::Error)]
#[error("storage backend error: {0}")]
pub struct StorageError(pub String);

/// Snapshot-consistent, buffered-until-commit persistence for the ledger
/// (spec §6). Getters observe this transaction's own prior writes within
/// the same block (so an edict can reference a rune etched earlier in the
/// same block); setters are not durable until [`commit_block`](Self::commit_block).
pub trait Storage {
    fn get_block_hash(&self, height: u64) -> Result<Option<BlockHash>, StorageError>;
    fn set_block_hash(&mut self, height: u64, hash: BlockHash) -> Result<(), StorageError>;
    fn get_current_height(&self) -> Result<Option<u64>, StorageError>;

    fn get_rune_entry(&self, id: RuneId) -> Result<Option<RuneEntry>, StorageError>;
    fn get_rune_entry_by_name(&self, rune: Rune) -> Result<Option<RuneEntry>, StorageError>;
    fn set_rune_entry(&mut self, id: RuneId, entry: RuneEntry) -> Result<(), StorageError>;

    fn get_utxo_balances(&self, txid: Txid, vout: u32) -> Result<Vec<(RuneId, u128)>, StorageError>;
    fn set_utxo_balances(
        &mut self,
        txid: Txid,
        vout: u32,
        balances: Vec<(RuneId, u128)>,
    ) -> Result<(), StorageError>;
    fn delete_utxo_balances(&mut self, txid: Txid, vout: u32) -> Result<(), StorageError>;

    fn increment_mints(&mut self, id: RuneId) -> Result<(), StorageError>;
    fn add_burned(&mut self, id: RuneId, amount: u128) -> Result<(), StorageError>;

    fn commit_block(&mut self) -> Result<(), StorageError>;
    fn abort_block(&mut self);
}

#[derive(Default)]
struct Committed {
    block_hashes: BTreeMap<u64, BlockHash>,
    rune_entries: HashMap<RuneId, RuneEntry>,
    rune_ids_by_name: HashMap<Rune, RuneId>,
    utxo_balances: HashMap<(Txid, u32), Vec<(RuneId, u128)>>,
}

#[derive(Default)]
struct Pending {
    block_hashes: BTreeMap<u64, BlockHash>,
    rune_entries: HashMap<RuneId, RuneEntry>,
    /// `None` marks a utxo staged for deletion.
    utxo_balances: HashMap<(Txid, u32), Option<Vec<(RuneId, u128)>>>,
}

/// In-process, `HashMap`-backed [`Storage`] implementation. Durable across
/// the process lifetime only; intended for the crate's own tests and for
/// small or ephemeral deployments, per spec §9's `Storage` design note
/// ("never store owning references; always look up through storage or the
/// per-tx working map").
#[derive(Default)]
pub struct MemoryStorage {
    committed: Committed,
    pending: Pending,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn rune_entry(&self, id: RuneId) -> Option<RuneEntry> {
        self.pending
            .rune_entries
            .get(&id)
            .cloned()
            .or_else(|| self.committed.rune_entries.get(&id).cloned())
    }
}

impl Storage for MemoryStorage {
    fn get_block_hash(&self, height: u64) -> Result<Option<BlockHash>, StorageError> {
        Ok(self
            .pending
            .block_hashes
            .get(&height)
            .copied()
            .or_else(|| self.committed.block_hashes.get(&height).copied()))
    }

    fn set_block_hash(&mut self, height: u64, hash: BlockHash) -> Result<(), StorageError> {
        self.pending.block_hashes.insert(height, hash);
        Ok(())
    }

    fn get_current_height(&self) -> Result<Option<u64>, StorageError> {
        let pending_max = self.pending.block_hashes.keys().next_back().copied();
        let committed_max = self.committed.block_hashes.keys().next_back().copied();
        Ok(pending_max.max(committed_max))
    }

    fn get_rune_entry(&self, id: RuneId) -> Result<Option<RuneEntry>, StorageError> {
        Ok(self.rune_entry(id))
    }

    fn get_rune_entry_by_name(&self, rune: Rune) -> Result<Option<RuneEntry>, StorageError> {
        // pending entries are scanned first so a rune etched earlier this
        // block is visible before it's committed.
        if let Some((id, _)) = self
            .pending
            .rune_entries
            .iter()
            .find(|(_, entry)| entry.rune == rune)
        {
            return Ok(self.rune_entry(*id));
        }

        let Some(id) = self.committed.rune_ids_by_name.get(&rune).copied() else {
            return Ok(None);
        };

        Ok(self.rune_entry(id))
    }

    fn set_rune_entry(&mut self, id: RuneId, entry: RuneEntry) -> Result<(), StorageError> {
        self.pending.rune_entries.insert(id, entry);
        Ok(())
    }

    fn get_utxo_balances(&self, txid: Txid, vout: u32) -> Result<Vec<(RuneId, u128)>, StorageError> {
        if let Some(staged) = self.pending.utxo_balances.get(&(txid, vout)) {
            return Ok(staged.clone().unwrap_or_default());
        }

        Ok(self
            .committed
            .utxo_balances
            .get(&(txid, vout))
            .cloned()
            .unwrap_or_default())
    }

    fn set_utxo_balances(
        &mut self,
        txid: Txid,
        vout: u32,
        balances: Vec<(RuneId, u128)>,
    ) -> Result<(), StorageError> {
        self.pending.utxo_balances.insert((txid, vout), Some(balances));
        Ok(())
    }

    fn delete_utxo_balances(&mut self, txid: Txid, vout: u32) -> Result<(), StorageError> {
        self.pending.utxo_balances.insert((txid, vout), None);
        Ok(())
    }

    fn increment_mints(&mut self, id: RuneId) -> Result<(), StorageError> {
        let mut entry = self
            .rune_entry(id)
            .ok_or_else(|| StorageError(format!("increment_mints: no rune entry for {id}")))?;
        entry.mints += 1;
        self.pending.rune_entries.insert(id, entry);
        Ok(())
    }

    fn add_burned(&mut self, id: RuneId, amount: u128) -> Result<(), StorageError> {
        let mut entry = self
            .rune_entry(id)
            .ok_or_else(|| StorageError(format!("add_burned: no rune entry for {id}")))?;
        entry.burned = entry.burned.saturating_add(amount);
        self.pending.rune_entries.insert(id, entry);
        Ok(())
    }

    fn commit_block(&mut self) -> Result<(), StorageError> {
        let pending = std::mem::take(&mut self.pending);

        self.committed.block_hashes.extend(pending.block_hashes);

        for (id, entry) in pending.rune_entries {
            self.committed.rune_ids_by_name.insert(entry.rune, id);
            self.committed.rune_entries.insert(id, entry);
        }

        for (key, value) in pending.utxo_balances {
            match value {
                Some(balances) => {
                    self.committed.utxo_balances.insert(key, balances);
                }
                None => {
                    self.committed.utxo_balances.remove(&key);
                }
            }
        }

        Ok(())
    }

    fn abort_block(&mut self) {
        self.pending = Pending::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::hashes::Hash;
    use std::str::FromStr;

    fn txid() -> Txid {
        Txid::all_zeros()
    }

    #[test]
    fn writes_are_invisible_to_a_fresh_storage_until_committed_but_visible_mid_block() {
        let mut storage = MemoryStorage::new();
        let id = RuneId::new(1, 0);

        storage
            .set_utxo_balances(txid(), 0, vec![(id, 100)])
            .unwrap();

        assert_eq!(storage.get_utxo_balances(txid(), 0).unwrap(), vec![(id, 100)]);

        storage.commit_block().unwrap();
        assert_eq!(storage.get_utxo_balances(txid(), 0).unwrap(), vec![(id, 100)]);
    }

    #[test]
    fn abort_discards_pending_writes() {
        let mut storage = MemoryStorage::new();
        let id = RuneId::new(1, 0);

        storage
            .set_utxo_balances(txid(), 0, vec![(id, 100)])
            .unwrap();
        storage.abort_block();

        assert_eq!(storage.get_utxo_balances(txid(), 0).unwrap(), Vec::new());
    }

    #[test]
    fn deleting_a_utxo_balance_after_commit_removes_it() {
        let mut storage = MemoryStorage::new();
        let id = RuneId::new(1, 0);

        storage
            .set_utxo_balances(txid(), 0, vec![(id, 100)])
            .unwrap();
        storage.commit_block().unwrap();

        storage.delete_utxo_balances(txid(), 0).unwrap();
        storage.commit_block().unwrap();

        assert_eq!(storage.get_utxo_balances(txid(), 0).unwrap(), Vec::new());
    }

    #[test]
    fn rune_entry_is_found_by_name_after_commit() {
        let mut storage = MemoryStorage::new();
        let id = RuneId::new(840_000, 1);
        let rune = Rune::from_str("TESTRUNE").unwrap();

        let entry = RuneEntry {
            rune_id: id,
            rune,
            spacers: 0,
            divisibility: 0,
            symbol: None,
            premine: 0,
            terms: None,
            turbo: false,
            etching_height: 840_000,
            mints: 0,
            burned: 0,
        };

        storage.set_rune_entry(id, entry.clone()).unwrap();
        storage.commit_block().unwrap();

        assert_eq!(storage.get_rune_entry_by_name(rune).unwrap(), Some(entry));
    }

    #[test]
    fn increment_mints_and_add_burned_update_the_existing_entry() {
        let mut storage = MemoryStorage::new();
        let id = RuneId::new(840_000, 1);
        let rune = Rune::from_str("TESTRUNE").unwrap();

        let entry = RuneEntry {
            rune_id: id,
            rune,
            spacers: 0,
            divisibility: 0,
            symbol: None,
            premine: 0,
            terms: None,
            turbo: false,
            etching_height: 840_000,
            mints: 0,
            burned: 0,
        };

        storage.set_rune_entry(id, entry).unwrap();
        storage.increment_mints(id).unwrap();
        storage.add_burned(id, 7).unwrap();

        let updated = storage.get_rune_entry(id).unwrap().unwrap();
        assert_eq!(updated.mints, 1);
        assert_eq!(updated.burned, 7);
    }

    #[test]
    fn current_height_is_the_highest_block_hash_recorded() {
        let mut storage = MemoryStorage::new();
        assert_eq!(storage.get_current_height().unwrap(), None);

        storage.set_block_hash(10, BlockHash::all_zeros()).unwrap();
        storage.commit_block().unwrap();
        assert_eq!(storage.get_current_height().unwrap(), Some(10));

        storage.set_block_hash(11, BlockHash::all_zeros()).unwrap();
        assert_eq!(storage.get_current_height().unwrap(), Some(11));
    }
}
