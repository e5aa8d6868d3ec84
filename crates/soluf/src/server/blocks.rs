use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use soluf_core::resolve::{parse_txid, resolve_block};
use soluf_core::types::{Block, Transaction};

use super::error::AppError;
use super::SharedState;

const DEFAULT_PAGE_LIMIT: usize = 25;
const MAX_PAGE_LIMIT: usize = 100;

// ==============================================================================
// DTOs
// ==============================================================================

#[derive(Deserialize)]
pub(super) struct PageQuery {
    offset: Option<usize>,
    limit: Option<usize>,
}

#[derive(Serialize)]
pub(super) struct BlockTransactionsPage {
    block_hash: bitcoin::BlockHash,
    total: usize,
    offset: usize,
    limit: usize,
    transactions: Vec<Transaction>,
}

// ==============================================================================
// Handlers
// ==============================================================================

pub(super) async fn get_block(
    State(state): State<SharedState>,
    Path(hash_or_height): Path<String>,
) -> Result<Json<Block>, AppError> {
    let block = resolve_block(state.rpc.as_ref(), &hash_or_height).await?;
    Ok(Json(block))
}

/// One page of fully decoded transactions, in block order.
pub(super) async fn get_block_transactions(
    State(state): State<SharedState>,
    Path(hash_or_height): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<BlockTransactionsPage>, AppError> {
    let offset = query.offset.unwrap_or(0);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    if limit == 0 || limit > MAX_PAGE_LIMIT {
        return Err(AppError::BadRequest(format!(
            "limit must be between 1 and {MAX_PAGE_LIMIT}"
        )));
    }

    let block = resolve_block(state.rpc.as_ref(), &hash_or_height).await?;
    let total = block.txids.len();
    let page = block
        .txids
        .get(offset.min(total)..offset.saturating_add(limit).min(total))
        .unwrap_or_default();
    let transactions = state.rpc.get_transactions(page).await?;

    Ok(Json(BlockTransactionsPage {
        block_hash: block.hash,
        total,
        offset,
        limit,
        transactions,
    }))
}

pub(super) async fn get_transaction(
    State(state): State<SharedState>,
    Path(txid): Path<String>,
) -> Result<Json<Transaction>, AppError> {
    let txid = parse_txid(&txid)?;
    Ok(Json(state.rpc.get_transaction(&txid).await?))
}
