mod blocks;
mod chain;
mod error;
mod search;

use std::sync::Arc;

use axum::routing::{any, get};
use axum::{Json, Router};
use eyre::WrapErr;
use tower_http::cors::{AllowOrigin, CorsLayer};

use soluf_core::rpc::BitcoinRpc;

use error::AppError;

/// Upper bound on blocks walked per dashboard or recent-blocks request.
pub(crate) const MAX_BLOCK_COUNT: usize = 50;

// ==============================================================================
// Application State
// ==============================================================================

pub struct AppState {
    pub rpc: Arc<dyn BitcoinRpc>,
    /// Blocks walked when a request does not pass `count`.
    pub dashboard_blocks: usize,
}

type SharedState = Arc<AppState>;

// ==============================================================================
// Router
// ==============================================================================

pub fn build_router(state: AppState, origin: &str) -> eyre::Result<Router> {
    // Only reflect the allowed origin when the request's Origin header
    // actually matches.
    let allowed: axum::http::HeaderValue = origin
        .parse()
        .wrap_err_with(|| format!("invalid CORS origin `{origin}`"))?;
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |request_origin: &axum::http::HeaderValue, _| *request_origin == allowed,
        ))
        .allow_methods([axum::http::Method::GET, axum::http::Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    let shared = Arc::new(state);

    let api = Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/status", get(chain::get_status))
        .route("/api/v1/hashrate", get(chain::get_hash_rate))
        .route("/api/v1/dashboard", get(chain::get_dashboard))
        .route("/api/v1/blocks/recent", get(chain::get_recent_blocks))
        .route("/api/v1/block/{hash_or_height}", get(blocks::get_block))
        .route(
            "/api/v1/block/{hash_or_height}/transactions",
            get(blocks::get_block_transactions),
        )
        .route("/api/v1/tx/{txid}", get(blocks::get_transaction))
        .route("/api/v1/search", get(search::search))
        .route("/api/v1/view", get(search::parse_view));

    Ok(Router::new()
        .merge(api)
        .route("/api", any(api_not_found))
        .route("/api/{*path}", any(api_not_found))
        .fallback(api_not_found)
        .layer(cors)
        .with_state(shared))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn api_not_found() -> AppError {
    AppError::NotFound("API route not found".to_string())
}

/// Apply the default and bounds to a `count` query parameter.
fn validate_count(count: Option<usize>, default: usize) -> Result<usize, AppError> {
    let count = count.unwrap_or(default);
    if count == 0 || count > MAX_BLOCK_COUNT {
        return Err(AppError::BadRequest(format!(
            "count must be between 1 and {MAX_BLOCK_COUNT}"
        )));
    }
    Ok(count)
}
