use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use soluf_core::resolve::parse_block_hash;
use soluf_core::types::{Block, BlockchainStatus};
use soluf_core::ChainOverview;

use super::error::AppError;
use super::{validate_count, SharedState};

// ==============================================================================
// DTOs
// ==============================================================================

#[derive(Deserialize)]
pub(super) struct CountQuery {
    count: Option<usize>,
}

#[derive(Deserialize)]
pub(super) struct RecentBlocksQuery {
    start: Option<String>,
    count: Option<usize>,
}

#[derive(Serialize)]
pub(super) struct HashRateResponse {
    hash_rate: f64,
}

// ==============================================================================
// Handlers
// ==============================================================================

pub(super) async fn get_status(
    State(state): State<SharedState>,
) -> Result<Json<BlockchainStatus>, AppError> {
    Ok(Json(state.rpc.get_blockchain_status().await?))
}

pub(super) async fn get_hash_rate(
    State(state): State<SharedState>,
) -> Result<Json<HashRateResponse>, AppError> {
    let hash_rate = state.rpc.get_network_hash_rate().await?;
    Ok(Json(HashRateResponse { hash_rate }))
}

pub(super) async fn get_dashboard(
    State(state): State<SharedState>,
    Query(query): Query<CountQuery>,
) -> Result<Json<ChainOverview>, AppError> {
    let count = validate_count(query.count, state.dashboard_blocks)?;
    let overview = soluf_core::chain_overview(state.rpc.as_ref(), count).await?;
    Ok(Json(overview))
}

/// Walk back from `start`, or from the current tip when omitted.
pub(super) async fn get_recent_blocks(
    State(state): State<SharedState>,
    Query(query): Query<RecentBlocksQuery>,
) -> Result<Json<Vec<Block>>, AppError> {
    let count = validate_count(query.count, state.dashboard_blocks)?;
    let start = match query.start.as_deref() {
        Some(text) => parse_block_hash(text)?,
        None => state.rpc.get_blockchain_status().await?.best_block_hash,
    };
    let blocks = soluf_core::recent_blocks(state.rpc.as_ref(), start, count).await?;
    Ok(Json(blocks))
}
