use axum::extract::Query;
use axum::Json;
use serde::{Deserialize, Serialize};

use soluf_core::{classify, Identifier};

use super::error::AppError;
use crate::view::View;

#[derive(Deserialize)]
pub(super) struct SearchQuery {
    #[serde(default)]
    q: String,
}

#[derive(Serialize)]
pub(super) struct SearchResponse {
    #[serde(flatten)]
    identifier: Identifier,
    fragment: String,
}

#[derive(Deserialize)]
pub(super) struct ViewQuery {
    #[serde(default)]
    fragment: String,
}

#[derive(Serialize)]
pub(super) struct ViewResponse {
    #[serde(flatten)]
    view: View,
    fragment: String,
}

/// Classify the search box text and tell the client where to navigate.
/// Nothing is fetched; the target view reports not-found itself.
pub(super) async fn search(
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, AppError> {
    if query.q.trim().is_empty() {
        return Err(AppError::BadRequest("search query must not be empty".into()));
    }
    let identifier = classify(&query.q);
    let fragment = View::from(&identifier).fragment();
    Ok(Json(SearchResponse {
        identifier,
        fragment,
    }))
}

pub(super) async fn parse_view(Query(query): Query<ViewQuery>) -> Json<ViewResponse> {
    let view = View::from_fragment(&query.fragment);
    let fragment = view.fragment();
    Json(ViewResponse { view, fragment })
}
