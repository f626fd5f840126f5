//! The Bitcoin JSON-RPC collaborator (spec §6). [`BitcoinRpc`] pins the
//! operations the indexer needs; [`BitcoincoreRpc`] thin-wraps the
//! teacher's `bitcoincore-rpc` crate the same way `orbtc/src/indexer/rt.rs`
//! and `orbtc/src/indexer/runes_indexer.rs` do.

use bitcoin::{Block, BlockHash, OutPoint, ScriptBuf, Transaction, Txid};
use bitcoincore_rpc::{Auth, Client, RpcApi};
use runestone::commitment::PrevoutLookup;

/// An RPC call failed or returned something the indexer couldn't use.
#[derive(Debug, thiserror::Error)]
#[error("bitcoin RPC error: {0}")]
pub struct RpcError(pub String);

/// The subset of `bitcoind`'s JSON-RPC surface the indexer core depends
/// on (spec §6): block lookups by height/hash and raw transaction fetch.
/// [`get_tx_prevout`](Self::get_tx_prevout) is a supplementary addition
/// (not in spec §6's bare operation list) needed to drive the commitment
/// validator without the core depending on a chain-wide UTXO index;
/// grounded on `RunesIndexer::validate_commitment`'s own
/// `get_raw_transaction_info` + `get_block_header_info` pair.
pub trait BitcoinRpc {
    fn get_block_count(&self) -> Result<u64, RpcError>;
    fn get_block_hash(&self, height: u64) -> Result<BlockHash, RpcError>;
    fn get_block(&self, hash: &BlockHash) -> Result<Block, RpcError>;
    fn get_raw_transaction(&self, txid: &Txid, block_hash: Option<&BlockHash>) -> Result<Transaction, RpcError>;

    /// Resolves an outpoint to the script it paid and the height it
    /// confirmed at, for the taproot-commitment maturity check (spec
    /// §4.J). `Ok(None)` if the RPC node doesn't know the transaction
    /// (pruned, or simply nonexistent).
    fn get_tx_prevout(&self, outpoint: &OutPoint) -> Result<Option<(ScriptBuf, u32)>, RpcError>;
}

/// [`BitcoinRpc`] backed by a real `bitcoind` node over `bitcoincore-rpc`.
pub struct BitcoincoreRpc {
    client: Client,
}

impl BitcoincoreRpc {
    pub fn connect(address: &str, user: String, password: String) -> Result<Self, RpcError> {
        let client =
            Client::new(address, Auth::UserPass(user, password)).map_err(|err| RpcError(err.to_string()))?;

        Ok(Self { client })
    }
}

impl BitcoinRpc for BitcoincoreRpc {
    fn get_block_count(&self) -> Result<u64, RpcError> {
        self.client.get_block_count().map_err(|err| RpcError(err.to_string()))
    }

    fn get_block_hash(&self, height: u64) -> Result<BlockHash, RpcError> {
        self.client
            .get_block_hash(height)
            .map_err(|err| RpcError(err.to_string()))
    }

    fn get_block(&self, hash: &BlockHash) -> Result<Block, RpcError> {
        self.client.get_block(hash).map_err(|err| RpcError(err.to_string()))
    }

    fn get_raw_transaction(&self, txid: &Txid, block_hash: Option<&BlockHash>) -> Result<Transaction, RpcError> {
        self.client
            .get_raw_transaction(txid, block_hash)
            .map_err(|err| RpcError(err.to_string()))
    }

    fn get_tx_prevout(&self, outpoint: &OutPoint) -> Result<Option<(ScriptBuf, u32)>, RpcError> {
        let info = match self.client.get_raw_transaction_info(&outpoint.txid, None) {
            Ok(info) => info,
            Err(_) => return Ok(None),
        };

        let Some(vout) = info.vout.get(outpoint.vout as usize) else {
            return Ok(None);
        };

        let Some(script_pubkey) = vout.script_pub_key.script().ok() else {
            return Ok(None);
        };

        let Some(block_hash) = info.blockhash else {
            return Ok(None);
        };

        let height = self
            .client
            .get_block_header_info(&block_hash)
            .map_err(|err| RpcError(err.to_string()))?
            .height as u32;

        Ok(Some((script_pubkey, height)))
    }
}

/// Bridges a [`BitcoinRpc`] into the `runestone` crate's
/// [`PrevoutLookup`](runestone::commitment::PrevoutLookup) so
/// [`commits_to_rune`](runestone::commitment::commits_to_rune) can run
/// against a live node without the core crate knowing RPC exists.
pub struct RpcPrevoutLookup<'a, R: BitcoinRpc> {
    pub rpc: &'a R,
}

impl<R: BitcoinRpc> PrevoutLookup for RpcPrevoutLookup<'_, R> {
    fn prevout(&self, outpoint: &OutPoint) -> Option<(ScriptBuf, u32)> {
        self.rpc.get_tx_prevout(outpoint).ok().flatten()
    }
}
