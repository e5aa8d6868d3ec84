//! View state carried in the browser URL fragment.
//!
//! The presentation layer has three screens. A fragment of `block-<id>` or
//! `tx-<id>` selects the block or transaction view; anything else, including
//! an empty fragment, falls back to the dashboard.

use serde::Serialize;

use soluf_core::Identifier;

const BLOCK_PREFIX: &str = "block-";
const TX_PREFIX: &str = "tx-";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", content = "id", rename_all = "snake_case")]
pub enum View {
    Dashboard,
    /// Block by hash or height, as typed.
    Block(String),
    Transaction(String),
}

impl View {
    pub fn from_fragment(fragment: &str) -> Self {
        let fragment = fragment.trim().trim_start_matches('#');
        if let Some(id) = fragment.strip_prefix(BLOCK_PREFIX).filter(|id| !id.is_empty()) {
            Self::Block(id.to_owned())
        } else if let Some(id) = fragment.strip_prefix(TX_PREFIX).filter(|id| !id.is_empty()) {
            Self::Transaction(id.to_owned())
        } else {
            Self::Dashboard
        }
    }

    pub fn fragment(&self) -> String {
        match self {
            Self::Dashboard => String::new(),
            Self::Block(id) => format!("{BLOCK_PREFIX}{id}"),
            Self::Transaction(id) => format!("{TX_PREFIX}{id}"),
        }
    }
}

impl From<&Identifier> for View {
    fn from(identifier: &Identifier) -> Self {
        match identifier {
            Identifier::Height(height) => Self::Block(height.to_string()),
            Identifier::BlockHash(hash) => Self::Block(hash.clone()),
            Identifier::Txid(txid) => Self::Transaction(txid.clone()),
        }
    }
}
