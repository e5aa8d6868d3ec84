use bitcoin::{BlockHash, Txid};

use crate::types::BlockHeight;

/// Failure of the HTTP exchange itself, not attributable to the node's
/// business logic.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status} with undecodable body: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// What a `NotFound` error was looking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFound {
    BlockHeight(BlockHeight),
    Block(BlockHash),
    Transaction(Txid),
}

impl std::fmt::Display for NotFound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlockHeight(height) => write!(f, "block at height {height}"),
            Self::Block(hash) => write!(f, "block {hash}"),
            Self::Transaction(txid) => write!(f, "transaction {txid}"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("{0} not found")]
    NotFound(NotFound),

    #[error("malformed RPC response: {0}")]
    MalformedResponse(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for CoreError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(TransportError::Http(err))
    }
}

impl CoreError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
