use std::collections::HashMap;
use std::future::Future;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bitcoin::{BlockHash, Txid};
use futures::future::try_join_all;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::{header, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::error::{CoreError, NotFound, TransportError};
use crate::types::{Block, BlockHeight, BlockchainStatus, Transaction};

use super::super::BitcoinRpc;
use super::connection::{parse_endpoint, resolve_auth};
use super::parsing::{
    parse_block, parse_block_hash_result, parse_blockchain_status, parse_hash_rate,
    parse_transaction,
};
use super::protocol::{parse_batch_id, JsonRpcRequest, JsonRpcResponse};
use super::retry::RetryPolicy;

/// Longest slice of an undecodable response body kept in error messages.
const ERROR_BODY_PREVIEW: usize = 512;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Connection settings for [`HttpRpcClient`].
#[derive(Debug, Clone)]
pub struct HttpRpcConfig {
    /// `http://` or `https://` endpoint, including any token path.
    pub endpoint: String,
    pub user: Option<String>,
    pub pass: Option<String>,
    /// Bitcoin Core `.cookie` file, used when `user`/`pass` are unset.
    pub cookie_file: Option<PathBuf>,
    /// Client-side cap on outbound HTTP requests (a batch counts as one).
    pub requests_per_second: Option<u32>,
    pub batch_chunk_size: usize,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl HttpRpcConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            user: None,
            pass: None,
            cookie_file: None,
            requests_per_second: None,
            batch_chunk_size: 25,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

/// Bitcoin Core JSON-RPC client over HTTP(S).
///
/// Every call carries a request timeout. Transient transport failures are
/// retried under the configured [`RetryPolicy`]; node error envelopes are
/// surfaced immediately. Nothing is cached: each call reflects the node's
/// current view.
pub struct HttpRpcClient {
    client: reqwest::Client,
    url: Url,
    auth: Option<(String, String)>,
    limiter: Option<DirectRateLimiter>,
    batch_chunk_size: usize,
    retry: RetryPolicy,
    next_id: AtomicU64,
}

impl HttpRpcClient {
    pub fn new(config: HttpRpcConfig) -> Result<Self, CoreError> {
        if config.batch_chunk_size == 0 {
            return Err(CoreError::Config(
                "rpc batch chunk size must be at least 1".to_owned(),
            ));
        }
        let auth = resolve_auth(
            config.user.as_deref(),
            config.pass.as_deref(),
            config.cookie_file.as_deref(),
        )?;
        let url = parse_endpoint(&config.endpoint)?;

        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(32)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| CoreError::Config(format!("build HTTP client: {e}")))?;

        let limiter = match config.requests_per_second {
            None => None,
            Some(limit) => {
                let limit = NonZeroU32::new(limit).ok_or_else(|| {
                    CoreError::Config("requests_per_second must be at least 1".to_owned())
                })?;
                Some(RateLimiter::direct(Quota::per_second(limit)))
            }
        };

        Ok(Self {
            client,
            url,
            auth,
            limiter,
            batch_chunk_size: config.batch_chunk_size,
            retry: config.retry,
            next_id: AtomicU64::new(initial_request_id()),
        })
    }

    /// Atomically reserve `count` consecutive request IDs for batch calls.
    fn reserve_request_ids(&self, count: u64) -> u64 {
        self.next_id.fetch_add(count, Ordering::Relaxed)
    }

    async fn wait_for_rate_limit(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }

    /// Run `op` until it succeeds, fails permanently, or the retry budget
    /// is spent.
    async fn with_retry<T, F, Fut>(&self, method: &str, mut op: F) -> Result<T, CoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Err(err) if self.retry.should_retry(attempt, &err) => {
                    attempt += 1;
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        rpc.method = method,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient rpc failure; retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }

    /// POST one JSON body and return the status and raw response text.
    async fn post_json<B: Serialize + ?Sized>(
        &self,
        body: &B,
    ) -> Result<(StatusCode, String), CoreError> {
        self.wait_for_rate_limit().await;

        let mut builder = self
            .client
            .post(self.url.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .json(body);
        if let Some((ref user, ref pass)) = self.auth {
            builder = builder.basic_auth(user, Some(pass));
        }

        let response = builder.send().await.map_err(TransportError::Http)?;
        let status = response.status();
        let text = response.text().await.map_err(TransportError::Http)?;
        Ok((status, text))
    }

    async fn rpc_call(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> Result<serde_json::Value, CoreError> {
        self.with_retry(method, || self.rpc_call_once(method, &params))
            .await
    }

    async fn rpc_call_once(
        &self,
        method: &str,
        params: &[serde_json::Value],
    ) -> Result<serde_json::Value, CoreError> {
        let id = self.reserve_request_ids(1);
        debug!(
            rpc.id = id,
            rpc.method = method,
            rpc.params = params.len(),
            "rpc call"
        );
        let req = JsonRpcRequest {
            jsonrpc: "2.0",
            id: id.to_string(),
            method,
            params,
        };

        let (status, body) = self.post_json(&req).await?;
        debug!(rpc.id = id, rpc.method = method, %status, body_len = body.len(), "rpc response");
        trace!(rpc.id = id, rpc.method = method, body = %body, "rpc response body");

        let decoded: JsonRpcResponse = decode_body(status, &body)?;
        check_envelope_status(status, &body, decoded)?.into_result()
    }

    /// Send `calls` as one JSON-RPC batch. Results come back in call order;
    /// each item keeps its own success or node error.
    async fn rpc_batch(
        &self,
        calls: &[(&'static str, Vec<serde_json::Value>)],
    ) -> Result<Vec<Result<serde_json::Value, CoreError>>, CoreError> {
        self.with_retry("batch", || self.rpc_batch_once(calls)).await
    }

    async fn rpc_batch_once(
        &self,
        calls: &[(&'static str, Vec<serde_json::Value>)],
    ) -> Result<Vec<Result<serde_json::Value, CoreError>>, CoreError> {
        let start_id = self.reserve_request_ids(calls.len() as u64);
        debug!(
            rpc.batch_start_id = start_id,
            rpc.batch_size = calls.len(),
            "rpc batch call"
        );
        let requests: Vec<JsonRpcRequest<'_>> = calls
            .iter()
            .enumerate()
            .map(|(offset, (method, params))| JsonRpcRequest {
                jsonrpc: "2.0",
                id: (start_id + offset as u64).to_string(),
                method: *method,
                params: params.as_slice(),
            })
            .collect();

        let (status, body) = self.post_json(&requests).await?;
        debug!(
            rpc.batch_start_id = start_id,
            rpc.batch_size = calls.len(),
            %status,
            body_len = body.len(),
            "rpc batch response"
        );
        trace!(
            rpc.batch_start_id = start_id,
            rpc.batch_size = calls.len(),
            body = %body,
            "rpc batch response body"
        );

        // Endpoints that reject batching answer with a single error envelope.
        let decoded: Vec<JsonRpcResponse> = match serde_json::from_str::<Vec<JsonRpcResponse>>(&body) {
            Ok(items) if status.is_success() || items.iter().any(JsonRpcResponse::has_error) => {
                items
            }
            Ok(_) => return Err(status_error(status, &body)),
            Err(_) => {
                let single: JsonRpcResponse = decode_body(status, &body)?;
                check_envelope_status(status, &body, single)?.into_result()?;
                return Err(CoreError::malformed(format!(
                    "expected JSON-RPC batch array, got single response; body={}",
                    preview(&body)
                )));
            }
        };

        let mut by_id: HashMap<u64, JsonRpcResponse> = HashMap::with_capacity(decoded.len());
        for item in decoded {
            let id = parse_batch_id(&item.id)?;
            by_id.insert(id, item);
        }

        let mut ordered = Vec::with_capacity(calls.len());
        for id in start_id..(start_id + calls.len() as u64) {
            let item = by_id
                .remove(&id)
                .ok_or_else(|| CoreError::malformed(format!("missing batch item with id {id}")))?;
            ordered.push(item.into_result());
        }

        Ok(ordered)
    }

    async fn rpc_batch_chunked(
        &self,
        calls: &[(&'static str, Vec<serde_json::Value>)],
    ) -> Result<Vec<Result<serde_json::Value, CoreError>>, CoreError> {
        if calls.is_empty() {
            return Ok(Vec::new());
        }

        // Keep each payload small enough for node/proxy limits while still
        // issuing chunks concurrently to avoid serial round-trip latency.
        let chunk_futures: Vec<_> = calls
            .chunks(self.batch_chunk_size)
            .map(|chunk| self.rpc_batch(chunk))
            .collect();
        let chunked = try_join_all(chunk_futures).await?;
        Ok(chunked.into_iter().flatten().collect())
    }
}

#[async_trait]
impl BitcoinRpc for HttpRpcClient {
    async fn get_blockchain_status(&self) -> Result<BlockchainStatus, CoreError> {
        let raw = self.rpc_call("getblockchaininfo", Vec::new()).await?;
        parse_blockchain_status(&raw)
    }

    async fn get_block_hash(&self, height: BlockHeight) -> Result<BlockHash, CoreError> {
        let raw = self
            .rpc_call("getblockhash", vec![serde_json::json!(*height)])
            .await
            .map_err(|err| normalize_getblockhash_error(height, err))?;
        parse_block_hash_result(&raw)
    }

    async fn get_block(&self, hash: &BlockHash) -> Result<Block, CoreError> {
        let raw = self
            .rpc_call(
                "getblock",
                vec![serde_json::json!(hash.to_string()), serde_json::json!(1)],
            )
            .await
            .map_err(|err| normalize_getblock_error(hash, err))?;
        let block = parse_block(&raw)?;
        if block.hash != *hash {
            return Err(CoreError::malformed(format!(
                "requested block {hash} but node returned {}",
                block.hash
            )));
        }
        Ok(block)
    }

    async fn get_transaction(&self, txid: &Txid) -> Result<Transaction, CoreError> {
        let raw = self
            .rpc_call("getrawtransaction", getrawtransaction_params(txid))
            .await
            .map_err(|err| normalize_getrawtransaction_error(txid, err))?;
        check_txid(txid, parse_transaction(&raw)?)
    }

    async fn get_transactions(&self, txids: &[Txid]) -> Result<Vec<Transaction>, CoreError> {
        if txids.is_empty() {
            return Ok(Vec::new());
        }

        let calls: Vec<(&'static str, Vec<serde_json::Value>)> = txids
            .iter()
            .map(|txid| ("getrawtransaction", getrawtransaction_params(txid)))
            .collect();

        let raw_results = match self.rpc_batch_chunked(&calls).await {
            Ok(results) => results,
            Err(batch_error) => {
                warn!(
                    tx_count = txids.len(),
                    error = %batch_error,
                    "batch getrawtransaction failed; falling back to sequential requests"
                );

                let mut sequential = Vec::with_capacity(txids.len());
                for txid in txids {
                    sequential.push(self.get_transaction(txid).await?);
                }
                return Ok(sequential);
            }
        };

        txids
            .iter()
            .zip(raw_results)
            .map(|(txid, raw)| {
                let raw = raw.map_err(|err| normalize_getrawtransaction_error(txid, err))?;
                check_txid(txid, parse_transaction(&raw)?)
            })
            .collect()
    }

    async fn get_network_hash_rate(&self) -> Result<f64, CoreError> {
        let raw = self.rpc_call("getnetworkhashps", Vec::new()).await?;
        parse_hash_rate(&raw)
    }
}

fn getrawtransaction_params(txid: &Txid) -> Vec<serde_json::Value> {
    vec![serde_json::json!(txid.to_string()), serde_json::json!(1)]
}

fn check_txid(requested: &Txid, tx: Transaction) -> Result<Transaction, CoreError> {
    if tx.txid != *requested {
        return Err(CoreError::malformed(format!(
            "requested transaction {requested} but node returned {}",
            tx.txid
        )));
    }
    Ok(tx)
}

/// Decode a response body. An undecodable body is a transport failure when
/// the HTTP status already signalled one, and a malformed response otherwise.
fn decode_body<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, CoreError> {
    serde_json::from_str(body).map_err(|e| {
        if status.is_success() {
            CoreError::malformed(format!(
                "decode JSON-RPC response: {e}; body={}",
                preview(body)
            ))
        } else {
            status_error(status, body)
        }
    })
}

/// A non-2xx reply only counts as a node answer when it carries a JSON-RPC
/// error. Gateways and proxies often answer with JSON that merely decodes as
/// an envelope, such as `429 {"message":"Too Many Requests"}`.
fn check_envelope_status(
    status: StatusCode,
    body: &str,
    response: JsonRpcResponse,
) -> Result<JsonRpcResponse, CoreError> {
    if status.is_success() || response.has_error() {
        Ok(response)
    } else {
        Err(status_error(status, body))
    }
}

fn status_error(status: StatusCode, body: &str) -> CoreError {
    CoreError::Transport(TransportError::Status {
        status,
        body: preview(body).to_owned(),
    })
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(ERROR_BODY_PREVIEW) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

fn initial_request_id() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(1)
}

// ==============================================================================
// RPC Error Normalization
// ==============================================================================
//
// Bitcoin Core reports missing objects as JSON-RPC errors. These helpers turn
// the relevant envelopes into typed `NotFound` errors while preserving every
// other failure as-is.

/// `RPC_INVALID_ADDRESS_OR_KEY`: unknown block hash or txid.
const RPC_INVALID_ADDRESS_OR_KEY: i64 = -5;
/// `RPC_INVALID_PARAMETER`: used by `getblockhash` for heights above the tip.
const RPC_INVALID_PARAMETER: i64 = -8;

fn normalize_getblockhash_error(height: BlockHeight, err: CoreError) -> CoreError {
    match err {
        CoreError::Rpc { code, ref message }
            if code == RPC_INVALID_PARAMETER
                && message.to_ascii_lowercase().contains("out of range") =>
        {
            CoreError::NotFound(NotFound::BlockHeight(height))
        }
        other => other,
    }
}

fn normalize_getblock_error(hash: &BlockHash, err: CoreError) -> CoreError {
    match err {
        CoreError::Rpc { code, ref message }
            if code == RPC_INVALID_ADDRESS_OR_KEY && is_not_found_message(message) =>
        {
            CoreError::NotFound(NotFound::Block(*hash))
        }
        other => other,
    }
}

/// Convert Bitcoin Core "missing tx" JSON-RPC responses into `NotFound`.
/// Without `-txindex` this also covers confirmed transactions the node
/// cannot look up.
fn normalize_getrawtransaction_error(txid: &Txid, err: CoreError) -> CoreError {
    match err {
        CoreError::Rpc { code, ref message }
            if code == RPC_INVALID_ADDRESS_OR_KEY && is_not_found_message(message) =>
        {
            CoreError::NotFound(NotFound::Transaction(*txid))
        }
        other => other,
    }
}

fn is_not_found_message(message: &str) -> bool {
    let msg = message.to_ascii_lowercase();
    msg.contains("not found") || msg.contains("no such mempool or blockchain transaction")
}
