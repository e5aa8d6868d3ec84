use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bitcoin::{BlockHash, Txid};

use crate::error::{CoreError, NotFound, TransportError};
use crate::types::{Block, BlockHeight, BlockchainStatus, Transaction};

use super::BitcoinRpc;

/// A mock Bitcoin RPC backend for testing. Serves canned blocks and
/// transactions from maps populated via the builder pattern, and can be told
/// to fail specific block fetches.
pub struct MockRpc {
    blocks: HashMap<BlockHash, Block>,
    heights: HashMap<BlockHeight, BlockHash>,
    transactions: HashMap<Txid, Transaction>,
    status: BlockchainStatus,
    hash_rate: f64,
    failing_blocks: Vec<BlockHash>,
    block_fetches: AtomicUsize,
    fetch_log: Mutex<Vec<BlockHash>>,
}

impl MockRpc {
    pub fn builder() -> MockRpcBuilder {
        MockRpcBuilder {
            blocks: HashMap::new(),
            transactions: HashMap::new(),
            status: None,
            hash_rate: 5.0e20,
            failing_blocks: Vec::new(),
        }
    }

    /// Number of `get_block` calls served so far, including failures.
    pub fn block_fetches(&self) -> usize {
        self.block_fetches.load(Ordering::SeqCst)
    }

    /// Hashes passed to `get_block`, in call order.
    pub fn fetch_log(&self) -> Vec<BlockHash> {
        self.fetch_log
            .lock()
            .expect("fetch log lock must not be poisoned")
            .clone()
    }
}

pub struct MockRpcBuilder {
    blocks: HashMap<BlockHash, Block>,
    transactions: HashMap<Txid, Transaction>,
    status: Option<BlockchainStatus>,
    hash_rate: f64,
    failing_blocks: Vec<BlockHash>,
}

impl MockRpcBuilder {
    pub fn with_block(mut self, block: Block) -> Self {
        self.blocks.insert(block.hash, block);
        self
    }

    pub fn with_chain(self, chain: Vec<Block>) -> Self {
        chain.into_iter().fold(self, MockRpcBuilder::with_block)
    }

    pub fn with_tx(mut self, tx: Transaction) -> Self {
        self.transactions.insert(tx.txid, tx);
        self
    }

    pub fn with_status(mut self, status: BlockchainStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_hash_rate(mut self, hash_rate: f64) -> Self {
        self.hash_rate = hash_rate;
        self
    }

    /// Make `get_block(hash)` fail with a transport error.
    pub fn failing_block(mut self, hash: BlockHash) -> Self {
        self.failing_blocks.push(hash);
        self
    }

    pub fn build(self) -> MockRpc {
        let heights = self
            .blocks
            .values()
            .map(|block| (block.height, block.hash))
            .collect();

        // Default status points at the highest block served.
        let status = self.status.unwrap_or_else(|| {
            let tip = self.blocks.values().max_by_key(|block| block.height);
            BlockchainStatus {
                chain: "regtest".into(),
                blocks: tip.map_or(0, |b| u64::from(*b.height)),
                headers: tip.map_or(0, |b| u64::from(*b.height)),
                best_block_hash: tip.map_or_else(
                    || crate::test_util::block_hash_from_byte(0),
                    |b| b.hash,
                ),
                difficulty: 1.0,
                median_time: tip.map_or(0, |b| b.median_time),
                verification_progress: 1.0,
                initial_block_download: Some(false),
                chainwork: tip.map(|b| b.chainwork),
                size_on_disk: 1_000,
                pruned: false,
                warnings: String::new(),
            }
        });

        MockRpc {
            blocks: self.blocks,
            heights,
            transactions: self.transactions,
            status,
            hash_rate: self.hash_rate,
            failing_blocks: self.failing_blocks,
            block_fetches: AtomicUsize::new(0),
            fetch_log: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl BitcoinRpc for MockRpc {
    async fn get_blockchain_status(&self) -> Result<BlockchainStatus, CoreError> {
        Ok(self.status.clone())
    }

    async fn get_block_hash(&self, height: BlockHeight) -> Result<BlockHash, CoreError> {
        self.heights
            .get(&height)
            .copied()
            .ok_or(CoreError::NotFound(NotFound::BlockHeight(height)))
    }

    async fn get_block(&self, hash: &BlockHash) -> Result<Block, CoreError> {
        self.block_fetches.fetch_add(1, Ordering::SeqCst);
        self.fetch_log
            .lock()
            .expect("fetch log lock must not be poisoned")
            .push(*hash);

        if self.failing_blocks.contains(hash) {
            return Err(CoreError::Transport(TransportError::Status {
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                body: "mock outage".into(),
            }));
        }
        self.blocks
            .get(hash)
            .cloned()
            .ok_or(CoreError::NotFound(NotFound::Block(*hash)))
    }

    async fn get_transaction(&self, txid: &Txid) -> Result<Transaction, CoreError> {
        self.transactions
            .get(txid)
            .cloned()
            .ok_or(CoreError::NotFound(NotFound::Transaction(*txid)))
    }

    async fn get_network_hash_rate(&self) -> Result<f64, CoreError> {
        Ok(self.hash_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::*;

    #[tokio::test]
    async fn default_status_tracks_highest_block() {
        let chain = make_chain(4);
        let tip_hash = chain[3].hash;
        let rpc = MockRpc::builder().with_chain(chain).build();

        let status = rpc.get_blockchain_status().await.unwrap();
        assert_eq!(status.blocks, 3);
        assert_eq!(status.best_block_hash, tip_hash);
    }

    #[tokio::test]
    async fn height_lookup_then_block_fetch_round_trips() {
        let rpc = MockRpc::builder().with_chain(make_chain(5)).build();
        for h in 0..5u32 {
            let hash = rpc.get_block_hash(BlockHeight(h)).await.unwrap();
            let block = rpc.get_block(&hash).await.unwrap();
            assert_eq!(block.height, BlockHeight(h));
        }
        let err = rpc.get_block_hash(BlockHeight(5)).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(NotFound::BlockHeight(_))));
    }

    #[tokio::test]
    async fn default_get_transactions_preserves_order_and_fails_on_missing() {
        let a = sample_tx(txid_from_byte(1));
        let b = sample_tx(txid_from_byte(2));
        let rpc = MockRpc::builder().with_tx(a).with_tx(b).build();

        let txs = rpc
            .get_transactions(&[txid_from_byte(2), txid_from_byte(1)])
            .await
            .unwrap();
        assert_eq!(txs[0].txid, txid_from_byte(2));
        assert_eq!(txs[1].txid, txid_from_byte(1));

        let err = rpc
            .get_transactions(&[txid_from_byte(1), txid_from_byte(3)])
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
