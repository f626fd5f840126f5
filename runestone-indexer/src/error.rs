//! Runtime errors surfaced to callers of [`RunestoneIndexer::update`](crate::RunestoneIndexer::update)
//! (spec §7): collaborator failures, as opposed to encoding mistakes or
//! decoding flaws, which belong to the `runestone` crate.

use bitcoin::BlockHash;

/// A failure that stopped indexing before the chain tip was reached. The
/// ledger is guaranteed not to have advanced past the last block whose
/// [`Storage::commit_block`](crate::Storage::commit_block) returned `Ok`
/// (spec §7).
#[derive(Debug, thiserror::Error)]
pub enum IndexerError {
    #[error("bitcoin RPC call failed: {0}")]
    Rpc(String),
    #[error("storage operation failed: {0}")]
    Storage(String),
    #[error("block at height {0} was not found by the RPC client")]
    BlockNotFound(u64),
    #[error(
        "chain reorganized: block at height {height} expected previous hash {expected} but RPC reports {actual}; roll storage back past this height and retry"
    )]
    Fork {
        height: u64,
        expected: BlockHash,
        actual: BlockHash,
    },
}
