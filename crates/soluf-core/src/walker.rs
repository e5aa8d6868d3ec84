use bitcoin::BlockHash;
use serde::Serialize;

use crate::error::CoreError;
use crate::rpc::BitcoinRpc;
use crate::types::{Block, BlockchainStatus};

// ==============================================================================
// Recent Block Walker
// ==============================================================================

/// Walk backwards from `start` along `previousblockhash` links, returning up
/// to `count` blocks ordered most-recent first.
///
/// Each fetch depends on the previous block's parent hash, so the walk is
/// strictly sequential. It stops early without error when it reaches a
/// block with no parent (genesis). Any fetch failure aborts the walk and is
/// returned as-is; blocks already fetched are discarded.
pub async fn recent_blocks(
    rpc: &dyn BitcoinRpc,
    start: BlockHash,
    count: usize,
) -> Result<Vec<Block>, CoreError> {
    if count == 0 {
        return Err(CoreError::InvalidArgument(
            "block count must be at least 1".into(),
        ));
    }

    let mut blocks: Vec<Block> = Vec::new();
    let mut cursor = Some(start);

    while let Some(hash) = cursor {
        if blocks.len() >= count {
            break;
        }
        let block = rpc.get_block(&hash).await?;
        cursor = block.previous_block_hash;
        blocks.push(block);
    }

    tracing::debug!(
        start = %start,
        requested = count,
        fetched = blocks.len(),
        "recent block walk complete"
    );
    Ok(blocks)
}

// ==============================================================================
// Chain Overview
// ==============================================================================

/// Everything the dashboard shows in one refresh.
#[derive(Debug, Clone, Serialize)]
pub struct ChainOverview {
    pub status: BlockchainStatus,
    pub hash_rate: f64,
    pub recent_blocks: Vec<Block>,
}

/// Fetch status and network hash rate concurrently, then walk `count`
/// blocks back from the reported chain tip.
pub async fn chain_overview(
    rpc: &dyn BitcoinRpc,
    count: usize,
) -> Result<ChainOverview, CoreError> {
    if count == 0 {
        return Err(CoreError::InvalidArgument(
            "block count must be at least 1".into(),
        ));
    }

    let (status, hash_rate) = tokio::try_join!(
        rpc.get_blockchain_status(),
        rpc.get_network_hash_rate()
    )?;
    let recent_blocks = recent_blocks(rpc, status.best_block_hash, count).await?;

    Ok(ChainOverview {
        status,
        hash_rate,
        recent_blocks,
    })
}
