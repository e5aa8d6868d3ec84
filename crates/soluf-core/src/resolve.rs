//! Navigation resolver: turns user-typed search text into the right fetch.
//!
//! Classification is a heuristic on the token's shape, not a structural
//! check. A 64-hex txid that happens to start with `0000` is classified as
//! a block hash, and `resolve` does not fall back to the other lookup.

use bitcoin::{BlockHash, Txid};
use serde::Serialize;

use crate::error::CoreError;
use crate::rpc::BitcoinRpc;
use crate::types::{Block, BlockHeight, Transaction};

/// Tokens shorter than this that are all digits are treated as heights.
pub const HEIGHT_MAX_LEN: usize = 10;

/// Leading zero nibbles that mark a token as a block hash. Mainnet block
/// hashes are far below this target; txids rarely are.
pub const BLOCK_HASH_PREFIX: &str = "0000";

/// A classified search token. The hash variants carry the raw text; it is
/// validated only when resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Identifier {
    Height(BlockHeight),
    BlockHash(String),
    Txid(String),
}

/// Classify a search token. Pure; surrounding whitespace is ignored.
pub fn classify(token: &str) -> Identifier {
    let token = token.trim();

    if token.len() < HEIGHT_MAX_LEN && !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
    {
        // Fewer than 10 digits always fits in a u32.
        if let Ok(height) = token.parse::<u32>() {
            return Identifier::Height(BlockHeight(height));
        }
    }

    if token.starts_with(BLOCK_HASH_PREFIX) {
        Identifier::BlockHash(token.to_owned())
    } else {
        Identifier::Txid(token.to_owned())
    }
}

pub fn parse_block_hash(text: &str) -> Result<BlockHash, CoreError> {
    parse_hex_hash(text, "block hash")
}

pub fn parse_txid(text: &str) -> Result<Txid, CoreError> {
    parse_hex_hash(text, "txid")
}

fn parse_hex_hash<T>(text: &str, what: &str) -> Result<T, CoreError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let text = text.trim();
    if text.len() != 64 || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(CoreError::InvalidArgument(format!(
            "{what} must be 64 hex characters, got `{text}`"
        )));
    }
    text.parse()
        .map_err(|e| CoreError::InvalidArgument(format!("invalid {what} `{text}`: {e}")))
}

/// The entity a search token resolved to.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Resolved {
    Block(Box<Block>),
    Transaction(Box<Transaction>),
}

/// Fetch whatever `identifier` names. Heights go through `getblockhash`
/// first; errors from either step propagate unchanged.
pub async fn resolve(rpc: &dyn BitcoinRpc, identifier: &Identifier) -> Result<Resolved, CoreError> {
    match identifier {
        Identifier::Height(height) => {
            let hash = rpc.get_block_hash(*height).await?;
            Ok(Resolved::Block(Box::new(rpc.get_block(&hash).await?)))
        }
        Identifier::BlockHash(text) => {
            let hash = parse_block_hash(text)?;
            Ok(Resolved::Block(Box::new(rpc.get_block(&hash).await?)))
        }
        Identifier::Txid(text) => {
            let txid = parse_txid(text)?;
            Ok(Resolved::Transaction(Box::new(
                rpc.get_transaction(&txid).await?,
            )))
        }
    }
}

/// Look up a block by height or hash, as the block view's route parameter
/// allows either.
pub async fn resolve_block(rpc: &dyn BitcoinRpc, hash_or_height: &str) -> Result<Block, CoreError> {
    let hash = match classify(hash_or_height) {
        Identifier::Height(height) => rpc.get_block_hash(height).await?,
        Identifier::BlockHash(text) | Identifier::Txid(text) => parse_block_hash(&text)?,
    };
    rpc.get_block(&hash).await
}
