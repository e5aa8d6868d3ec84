use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use soluf_core::CoreError;

// ==============================================================================
// Error Type
// ==============================================================================

#[derive(Debug)]
pub(crate) enum AppError {
    BadRequest(String),
    NotFound(String),
    BadGateway(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound(_) => Self::NotFound(err.to_string()),
            CoreError::InvalidArgument(_) => Self::BadRequest(err.to_string()),
            CoreError::Transport(_) | CoreError::Rpc { .. } | CoreError::MalformedResponse(_) => {
                tracing::warn!(error = %err, "upstream node request failed");
                Self::BadGateway(err.to_string())
            }
            CoreError::Config(_) => Self::Internal(err.to_string()),
        }
    }
}
