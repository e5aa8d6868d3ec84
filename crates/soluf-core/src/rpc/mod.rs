//! Bitcoin Core RPC abstraction layer.
//!
//! Defines the [`BitcoinRpc`] gateway trait and provides an HTTP JSON-RPC
//! implementation ([`HttpRpcClient`]) plus a test mock (`mock::MockRpc`).

mod http_adapter;
#[cfg(test)]
pub mod mock;

pub use http_adapter::{HttpRpcClient, HttpRpcConfig, RetryPolicy};

use async_trait::async_trait;
use bitcoin::{BlockHash, Txid};

use crate::error::CoreError;
use crate::types::{Block, BlockHeight, BlockchainStatus, Transaction};

/// The Bitcoin Core RPC methods the explorer reads from.
///
/// Every method is idempotent and side-effect free. Implementations map
/// node "not found" conditions to [`CoreError::NotFound`] and never return
/// partially populated entities.
#[async_trait]
pub trait BitcoinRpc: Send + Sync {
    /// Chain state from `getblockchaininfo`.
    async fn get_blockchain_status(&self) -> Result<BlockchainStatus, CoreError>;

    /// Hash of the active-chain block at `height`. Heights above the tip
    /// fail with `NotFound`.
    async fn get_block_hash(&self, height: BlockHeight) -> Result<BlockHash, CoreError>;

    /// Block header fields and txids (`getblock` verbosity 1).
    async fn get_block(&self, hash: &BlockHash) -> Result<Block, CoreError>;

    /// Fetch a decoded transaction by txid.
    async fn get_transaction(&self, txid: &Txid) -> Result<Transaction, CoreError>;

    /// Fetch many decoded transactions. Implementations may batch these
    /// requests into one or more RPC calls. Output order matches `txids`.
    async fn get_transactions(&self, txids: &[Txid]) -> Result<Vec<Transaction>, CoreError> {
        let mut results = Vec::with_capacity(txids.len());
        for txid in txids {
            results.push(self.get_transaction(txid).await?);
        }
        Ok(results)
    }

    /// Estimated network hashes per second over the node's default window.
    async fn get_network_hash_rate(&self) -> Result<f64, CoreError>;
}
