//! Shared test helpers for `soluf-core` unit tests.
//!
//! Consolidates node-shaped JSON fixtures (for normalizer tests) and domain
//! builders (for gateway mock and walker tests) so every module shares a
//! single source of truth for dummy data.

use bitcoin::hashes::Hash;
use bitcoin::{Amount, BlockHash, CompactTarget, ScriptBuf, TxMerkleNode, Txid, Wtxid};

use crate::types::{
    Block, BlockHeight, Chainwork, ScriptPubKey, ScriptType, Transaction, TxInput, TxOutput,
};

pub const GENESIS_HASH: &str = "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f";
pub const GENESIS_COINBASE_TXID: &str =
    "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b";
pub const SPEND_TXID: &str = "a1b2c3d4e5f60718293a4b5c6d7e8f90a1b2c3d4e5f60718293a4b5c6d7e8f90";

// ==============================================================================
// Node JSON Fixtures
// ==============================================================================

pub fn blockchain_info_json() -> serde_json::Value {
    serde_json::json!({
        "chain": "main",
        "blocks": 850_000,
        "headers": 850_002,
        "bestblockhash": "00000000000000000002a7c4c1e48d76c5a37902165a270156b7a8d72728a054",
        "difficulty": 83_148_355_189_239.77,
        "time": 1_719_000_000,
        "mediantime": 1_718_998_000,
        "verificationprogress": 0.9999987,
        "initialblockdownload": false,
        "chainwork": "00000000000000000000000000000000000000007dbc3a1e8c0d1d3b8b0e4e30",
        "size_on_disk": 650_000_000_000u64,
        "pruned": false,
        "warnings": ""
    })
}

/// A verbosity-1 `getblock` result. Chainwork grows with height so chains
/// built from this fixture keep the monotonic-work property.
pub fn block_json(
    hash: &str,
    height: u32,
    previous: Option<&str>,
    txids: &[&str],
) -> serde_json::Value {
    let mut block = serde_json::json!({
        "hash": hash,
        "confirmations": 850_001 - i64::from(height),
        "height": height,
        "version": 1,
        "versionHex": "00000001",
        "merkleroot": GENESIS_COINBASE_TXID,
        "time": 1_231_006_505u64 + u64::from(height) * 600,
        "mediantime": 1_231_006_505u64 + u64::from(height) * 600,
        "nonce": 2_083_236_893u32,
        "bits": "1d00ffff",
        "difficulty": 1.0,
        "chainwork": format!("{:064x}", u64::from(height) + 1),
        "nTx": txids.len(),
        "size": 285,
        "strippedsize": 285,
        "weight": 1140,
        "tx": txids,
    });
    if let Some(previous) = previous {
        block["previousblockhash"] = serde_json::json!(previous);
    }
    block
}

pub fn coinbase_tx_json() -> serde_json::Value {
    serde_json::json!({
        "txid": GENESIS_COINBASE_TXID,
        "hash": GENESIS_COINBASE_TXID,
        "version": 1,
        "size": 204,
        "vsize": 204,
        "weight": 816,
        "locktime": 0,
        "vin": [{
            "coinbase": "04ffff001d0104455468652054696d65732030332f4a616e2f32303039204368616e63656c6c6f72206f6e206272696e6b206f66207365636f6e64206261696c6f757420666f722062616e6b73",
            "sequence": 4_294_967_295u32
        }],
        "vout": [{
            "value": 50.0,
            "n": 0,
            "scriptPubKey": {
                "asm": "04678afdb0fe5548271967f1a67130b7105cd6a828e03909a67962e0ea1f61deb649f6bc3f4cef38c4f35504e51ec112de5c384df7ba0b8d578a4c702b6bf11d5f OP_CHECKSIG",
                "hex": "4104678afdb0fe5548271967f1a67130b7105cd6a828e03909a67962e0ea1f61deb649f6bc3f4cef38c4f35504e51ec112de5c384df7ba0b8d578a4c702b6bf11d5fac",
                "type": "pubkey"
            }
        }],
        "hex": "01000000010000000000000000000000000000000000000000000000000000000000000000ffffffff4d04ffff001d0104455468652054696d65732030332f4a616e2f32303039204368616e63656c6c6f72206f6e206272696e6b206f66207365636f6e64206261696c6f757420666f722062616e6b73ffffffff0100f2052a01000000434104678afdb0fe5548271967f1a67130b7105cd6a828e03909a67962e0ea1f61deb649f6bc3f4cef38c4f35504e51ec112de5c384df7ba0b8d578a4c702b6bf11d5fac00000000",
        "blockhash": GENESIS_HASH,
        "confirmations": 850_001,
        "time": 1_231_006_505u64,
        "blocktime": 1_231_006_505u64
    })
}

pub fn segwit_spend_tx_json() -> serde_json::Value {
    serde_json::json!({
        "txid": SPEND_TXID,
        "hash": "0f1e2d3c4b5a69788796a5b4c3d2e1f00f1e2d3c4b5a69788796a5b4c3d2e1f0",
        "version": 2,
        "size": 222,
        "vsize": 141,
        "weight": 561,
        "locktime": 849_999,
        "vin": [{
            "txid": GENESIS_COINBASE_TXID,
            "vout": 1,
            "scriptSig": { "asm": "", "hex": "" },
            "txinwitness": [
                "3044022000112233445566778899aabbccddeeff00112233445566778899aabbccddeeff022000112233445566778899aabbccddeeff00112233445566778899aabbccddeeff01",
                "02abababababababababababababababababababababababababababababababab"
            ],
            "sequence": 4_294_967_293u32
        }],
        "vout": [
            {
                "value": 0.0015,
                "n": 0,
                "scriptPubKey": {
                    "asm": "0 abababababababababababababababababababab",
                    "hex": "0014abababababababababababababababababababab",
                    "address": "bc1q4w46h2at4w46h2at4w46h2at4w46h2atsghld7",
                    "type": "witness_v0_keyhash"
                }
            },
            {
                "value": 0.00048,
                "n": 1,
                "scriptPubKey": {
                    "asm": "1 cdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcd",
                    "hex": "5120cdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcd",
                    "type": "witness_v1_taproot"
                }
            }
        ],
        "hex": "02000000000101",
        "blockhash": "00000000000000000002a7c4c1e48d76c5a37902165a270156b7a8d72728a054",
        "confirmations": 3,
        "time": 1_719_000_000u64,
        "blocktime": 1_719_000_000u64
    })
}

// ==============================================================================
// Domain Builders
// ==============================================================================

/// Create a deterministic `Txid` from a single distinguishing byte.
pub fn txid_from_byte(b: u8) -> Txid {
    let mut bytes = [0u8; 32];
    bytes[0] = b;
    Txid::from_byte_array(bytes)
}

/// Create a deterministic `BlockHash` from a single distinguishing byte.
pub fn block_hash_from_byte(b: u8) -> BlockHash {
    let mut bytes = [0u8; 32];
    bytes[0] = b;
    bytes[31] = 0xb1;
    BlockHash::from_byte_array(bytes)
}

/// Build a minimal domain `Block` with sane defaults.
/// Override individual fields after construction when needed.
pub fn make_block(hash: BlockHash, height: u32, previous: Option<BlockHash>) -> Block {
    let mut work = [0u8; 32];
    work[28..].copy_from_slice(&(height + 1).to_be_bytes());
    Block {
        hash,
        height: BlockHeight(height),
        version: 0x2000_0000,
        merkle_root: TxMerkleNode::all_zeros(),
        txids: vec![txid_from_byte(height as u8)],
        time: 1_700_000_000 + u64::from(height) * 600,
        median_time: 1_700_000_000 + u64::from(height) * 600,
        nonce: height,
        bits: CompactTarget::from_consensus(0x1d00_ffff),
        difficulty: 1.0,
        chainwork: Chainwork(work),
        n_tx: 1,
        previous_block_hash: previous,
        next_block_hash: None,
        size: 285,
        confirmations: 1,
    }
}

/// Build a linked chain of `len` blocks from genesis (index 0) to tip,
/// with `next_block_hash` and `confirmations` filled in.
pub fn make_chain(len: u8) -> Vec<Block> {
    let mut chain: Vec<Block> = Vec::with_capacity(len as usize);
    for height in 0..len {
        let previous = chain.last().map(|b| b.hash);
        chain.push(make_block(
            block_hash_from_byte(height),
            u32::from(height),
            previous,
        ));
    }
    let tip = u64::from(len.saturating_sub(1));
    for i in 0..chain.len() {
        let next = chain.get(i + 1).map(|b| b.hash);
        let block = &mut chain[i];
        block.confirmations = tip - u64::from(*block.height) + 1;
        block.next_block_hash = next;
    }
    chain
}

/// A confirmed one-input, one-output coinbase transaction.
pub fn sample_tx(txid: Txid) -> Transaction {
    Transaction {
        txid,
        hash: Wtxid::from_byte_array(txid.to_byte_array()),
        version: 2,
        size: 100,
        vsize: 100,
        weight: 400,
        locktime: 0,
        inputs: vec![TxInput::Coinbase {
            data: "03a0bb0d".into(),
            sequence: 0xFFFF_FFFF,
        }],
        outputs: vec![TxOutput {
            value: Amount::from_sat(312_500_000),
            n: 0,
            script_pub_key: ScriptPubKey {
                asm: "OP_TRUE".into(),
                script: ScriptBuf::from_bytes(vec![0x51]),
                script_type: ScriptType::Unknown,
                addresses: Vec::new(),
            },
        }],
        hex: "02000000".into(),
        block_hash: Some(block_hash_from_byte(1)),
        confirmations: Some(1),
        time: Some(1_700_000_000),
        blocktime: Some(1_700_000_000),
    }
}
