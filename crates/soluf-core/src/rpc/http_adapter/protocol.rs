use crate::error::CoreError;

#[derive(serde::Serialize)]
pub(super) struct JsonRpcRequest<'a> {
    pub(super) jsonrpc: &'static str,
    pub(super) id: String,
    pub(super) method: &'a str,
    pub(super) params: &'a [serde_json::Value],
}

#[derive(Debug, serde::Deserialize)]
pub(super) struct JsonRpcResponse {
    #[serde(default)]
    pub(super) id: serde_json::Value,
    pub(super) result: Option<serde_json::Value>,
    pub(super) error: Option<serde_json::Value>,
}

impl JsonRpcResponse {
    pub(super) fn has_error(&self) -> bool {
        matches!(&self.error, Some(err) if !err.is_null())
    }

    /// Split the envelope into the `result` value or a typed error.
    /// A missing `result` on success decodes as JSON `null`.
    pub(super) fn into_result(self) -> Result<serde_json::Value, CoreError> {
        match self.error {
            Some(err) if !err.is_null() => Err(parse_jsonrpc_error(err)),
            _ => Ok(self.result.unwrap_or(serde_json::Value::Null)),
        }
    }
}

/// Parse a JSON-RPC error value into a structured `CoreError`.
///
/// JSON-RPC 2.0 defines errors as `{"code": <int>, "message": <string>}`.
/// If the error value matches that shape, we produce `CoreError::Rpc`;
/// otherwise we fall back to `MalformedResponse` with the raw JSON.
pub(super) fn parse_jsonrpc_error(err: serde_json::Value) -> CoreError {
    #[derive(serde::Deserialize)]
    struct JsonRpcError {
        code: i64,
        message: String,
    }

    match serde_json::from_value::<JsonRpcError>(err.clone()) {
        Ok(parsed) => CoreError::Rpc {
            code: parsed.code,
            message: parsed.message,
        },
        Err(_) => CoreError::malformed(format!("non-standard JSON-RPC error: {err}")),
    }
}

/// Request ids travel as decimal strings; accept numeric ids too since some
/// proxies rewrite them.
pub(super) fn parse_batch_id(id: &serde_json::Value) -> Result<u64, CoreError> {
    if let Some(n) = id.as_u64() {
        return Ok(n);
    }

    if let Some(s) = id.as_str() {
        return s
            .parse::<u64>()
            .map_err(|e| CoreError::malformed(format!("invalid batch response id string: {e}")));
    }

    Err(CoreError::malformed(format!("invalid batch response id: {id}")))
}
