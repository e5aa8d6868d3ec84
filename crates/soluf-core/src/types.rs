//! Domain types for the explorer's read-only chain model.
//!
//! Every entity here is an immutable snapshot built from node JSON by the
//! response normalizer. Nothing is cached or mutated after construction.

use std::str::FromStr;

use bitcoin::hex::{DisplayHex, FromHex};
use bitcoin::{
    Amount, BlockHash, CompactTarget, OutPoint, Script, ScriptBuf, TxMerkleNode, Txid, Wtxid,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ==============================================================================
// Block Height
// ==============================================================================

/// A Bitcoin block height, wrapped for type safety.
///
/// `#[serde(transparent)]` keeps the JSON representation a bare integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockHeight(pub u32);

impl From<u32> for BlockHeight {
    fn from(h: u32) -> Self {
        Self(h)
    }
}

impl From<BlockHeight> for u32 {
    fn from(h: BlockHeight) -> Self {
        h.0
    }
}

impl std::ops::Deref for BlockHeight {
    type Target = u32;
    fn deref(&self) -> &u32 {
        &self.0
    }
}

impl std::fmt::Display for BlockHeight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// ==============================================================================
// Chainwork
// ==============================================================================

/// Cumulative proof-of-work as a 256-bit big-endian integer.
///
/// Byte-wise ordering of a fixed-width big-endian array is numeric ordering,
/// so the derived `Ord` compares work amounts directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Chainwork(pub [u8; 32]);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid chainwork `{0}`: expected up to 64 hex characters")]
pub struct ChainworkParseError(String);

impl FromStr for Chainwork {
    type Err = ChainworkParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s.len() > 64 {
            return Err(ChainworkParseError(s.to_owned()));
        }
        // Left-pad odd-length input so the hex decoder sees whole bytes.
        let padded = if s.len() % 2 == 1 {
            format!("0{s}")
        } else {
            s.to_owned()
        };
        let bytes = Vec::<u8>::from_hex(&padded).map_err(|_| ChainworkParseError(s.to_owned()))?;
        let mut out = [0u8; 32];
        out[32 - bytes.len()..].copy_from_slice(&bytes);
        Ok(Self(out))
    }
}

impl std::fmt::Display for Chainwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0.to_lower_hex_string())
    }
}

impl Serialize for Chainwork {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Chainwork {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// `bits` travels as the node's 8-digit unprefixed hex form.
mod compact_target_hex {
    use bitcoin::CompactTarget;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(
        bits: &CompactTarget,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{:08x}", bits.to_consensus()))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<CompactTarget, D::Error> {
        let s = String::deserialize(deserializer)?;
        u32::from_str_radix(&s, 16)
            .map(CompactTarget::from_consensus)
            .map_err(serde::de::Error::custom)
    }
}

// ==============================================================================
// Chain Status
// ==============================================================================

/// Chain state as reported by `getblockchaininfo`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockchainStatus {
    pub chain: String,
    pub blocks: u64,
    pub headers: u64,
    pub best_block_hash: BlockHash,
    pub difficulty: f64,
    pub median_time: u64,
    /// Always within `0.0..=1.0`.
    pub verification_progress: f64,
    pub initial_block_download: Option<bool>,
    pub chainwork: Option<Chainwork>,
    pub size_on_disk: u64,
    pub pruned: bool,
    pub warnings: String,
}

// ==============================================================================
// Blocks
// ==============================================================================

/// A block as returned by `getblock` at verbosity 1: header fields plus the
/// ordered list of transaction ids, not full transaction bodies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub hash: BlockHash,
    pub height: BlockHeight,
    pub version: i32,
    pub merkle_root: TxMerkleNode,
    /// In-block order; never empty since every block carries a coinbase.
    pub txids: Vec<Txid>,
    pub time: u64,
    pub median_time: u64,
    pub nonce: u32,
    #[serde(with = "compact_target_hex")]
    pub bits: CompactTarget,
    pub difficulty: f64,
    pub chainwork: Chainwork,
    /// Equals `txids.len()`.
    pub n_tx: usize,
    /// `None` only for the genesis block.
    pub previous_block_hash: Option<BlockHash>,
    /// `None` for the chain tip.
    pub next_block_hash: Option<BlockHash>,
    pub size: u64,
    pub confirmations: u64,
}

impl Block {
    pub fn is_genesis(&self) -> bool {
        self.previous_block_hash.is_none()
    }

    pub fn coinbase_txid(&self) -> Option<&Txid> {
        self.txids.first()
    }
}

// ==============================================================================
// Script Type Classification
// ==============================================================================

/// Locally derived output script class. Detection is delegated to the
/// `bitcoin` crate's `Script::is_*` predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptType {
    P2pk,
    P2pkh,
    P2sh,
    P2wpkh,
    P2wsh,
    P2tr,
    BareMultisig,
    OpReturn,
    Unknown,
}

impl std::fmt::Display for ScriptType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::P2pk => write!(f, "p2pk"),
            Self::P2pkh => write!(f, "p2pkh"),
            Self::P2sh => write!(f, "p2sh"),
            Self::P2wpkh => write!(f, "p2wpkh"),
            Self::P2wsh => write!(f, "p2wsh"),
            Self::P2tr => write!(f, "p2tr"),
            Self::BareMultisig => write!(f, "bare_multisig"),
            Self::OpReturn => write!(f, "op_return"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

pub fn classify_script(script: &Script) -> ScriptType {
    if script.is_p2pk() {
        ScriptType::P2pk
    } else if script.is_p2pkh() {
        ScriptType::P2pkh
    } else if script.is_p2sh() {
        ScriptType::P2sh
    } else if script.is_p2wpkh() {
        ScriptType::P2wpkh
    } else if script.is_p2wsh() {
        ScriptType::P2wsh
    } else if script.is_p2tr() {
        ScriptType::P2tr
    } else if script.is_multisig() {
        ScriptType::BareMultisig
    } else if script.is_op_return() {
        ScriptType::OpReturn
    } else {
        ScriptType::Unknown
    }
}

// ==============================================================================
// Transactions
// ==============================================================================

/// A decoded transaction from `getrawtransaction` (verbose).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub txid: Txid,
    /// Witness hash; equals `txid` for transactions without witness data.
    pub hash: Wtxid,
    pub version: i32,
    pub size: u64,
    pub vsize: u64,
    pub weight: u64,
    pub locktime: u32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub hex: String,
    /// The remaining fields are `None` for mempool transactions.
    pub block_hash: Option<BlockHash>,
    pub confirmations: Option<u64>,
    pub time: Option<u64>,
    pub blocktime: Option<u64>,
}

impl Transaction {
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && matches!(self.inputs[0], TxInput::Coinbase { .. })
    }

    /// Sum of all output values. `None` on overflow, which a valid
    /// transaction cannot produce.
    pub fn total_output_value(&self) -> Option<Amount> {
        self.outputs
            .iter()
            .try_fold(Amount::ZERO, |acc, out| acc.checked_add(out.value))
    }

    pub fn has_witness(&self) -> bool {
        self.txid.to_raw_hash() != self.hash.to_raw_hash()
    }
}

/// Unlocking script of a spending input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptSig {
    pub asm: String,
    pub script: ScriptBuf,
}

/// A transaction input: either the coinbase or a spend of a previous output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TxInput {
    Coinbase {
        /// Arbitrary miner data, hex encoded.
        data: String,
        sequence: u32,
    },
    Spend {
        prevout: OutPoint,
        script_sig: ScriptSig,
        /// Witness stack items, hex encoded. Empty for legacy inputs.
        witness: Vec<String>,
        sequence: u32,
    },
}

impl TxInput {
    pub fn sequence(&self) -> u32 {
        match self {
            Self::Coinbase { sequence, .. } | Self::Spend { sequence, .. } => *sequence,
        }
    }

    pub fn prevout(&self) -> Option<&OutPoint> {
        match self {
            Self::Coinbase { .. } => None,
            Self::Spend { prevout, .. } => Some(prevout),
        }
    }
}

/// Locking script descriptor of an output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptPubKey {
    pub asm: String,
    pub script: ScriptBuf,
    pub script_type: ScriptType,
    /// Addresses derived by the node; empty for non-standard scripts.
    pub addresses: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxOutput {
    pub value: Amount,
    /// 0-based output index, equal to the output's position.
    pub n: u32,
    pub script_pub_key: ScriptPubKey,
}
