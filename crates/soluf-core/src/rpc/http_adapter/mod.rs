//! Native JSON-RPC client for Bitcoin Core compatible endpoints.
//!
//! Implements [`BitcoinRpc`](super::BitcoinRpc) over JSON-RPC using
//! `reqwest`, with request timeouts, bounded retry for transient transport
//! failures, optional request rate limiting, single and batched calls, and
//! basic auth.

mod client;
mod connection;
mod parsing;
mod protocol;
mod retry;

pub use client::{HttpRpcClient, HttpRpcConfig};
pub use retry::RetryPolicy;
