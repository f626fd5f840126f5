//! Storage- and RPC-facing orchestration around the `runestone` protocol
//! engine: walks a Bitcoin node's blocks forward into a [`Storage`]
//! backend, folding each transaction through `runestone::ledger`. The
//! block-walking loop, persistence trait, and RPC trait are grounded on
//! the teacher indexer's own `Rt`/`RunesIndexer`/`Config` split, adapted
//! from its Postgres-specific implementation to the trait boundaries this
//! crate exposes.

pub mod apply;
pub mod config;
pub mod error;
pub mod indexer;
pub mod rpc;
pub mod storage;

pub use config::{BitcoinRpcConfig, IndexerConfig};
pub use error::IndexerError;
pub use indexer::{RunestoneIndexer, UpdateSummary};
pub use rpc::{BitcoinRpc, BitcoincoreRpc, RpcError};
pub use storage::{MemoryStorage, Storage, StorageError};
