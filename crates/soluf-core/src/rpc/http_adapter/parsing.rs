//! Response normalizer: maps raw node JSON into the domain model.
//!
//! Optional node fields become `Option`s; anything the domain model
//! requires but the node omitted, or any value that breaks an entity
//! invariant, is a `MalformedResponse`.

use std::str::FromStr;

use bitcoin::{Amount, BlockHash, CompactTarget, OutPoint, ScriptBuf, TxMerkleNode, Txid, Wtxid};
use serde_json::Value;

use crate::error::CoreError;
use crate::types::{
    classify_script, Block, BlockHeight, BlockchainStatus, Chainwork, ScriptPubKey, ScriptSig,
    Transaction, TxInput, TxOutput,
};

// ==============================================================================
// Method Results
// ==============================================================================

pub(super) fn parse_blockchain_status(raw: &Value) -> Result<BlockchainStatus, CoreError> {
    let blocks = parse_integer_required::<u64, false>(raw.get("blocks"), "blocks")?;
    let headers = parse_integer_required::<u64, false>(raw.get("headers"), "headers")?;
    if blocks > headers {
        return Err(CoreError::malformed(format!(
            "blocks ({blocks}) exceeds headers ({headers})"
        )));
    }

    let verification_progress =
        parse_f64_required(raw.get("verificationprogress"), "verificationprogress")?;
    if !(0.0..=1.0).contains(&verification_progress) {
        return Err(CoreError::malformed(format!(
            "verificationprogress out of range: {verification_progress}"
        )));
    }

    let chainwork = match raw.get("chainwork").and_then(Value::as_str) {
        None => None,
        Some(s) => Some(parse_chainwork(s)?),
    };

    Ok(BlockchainStatus {
        chain: parse_str_required(raw.get("chain"), "chain")?.to_owned(),
        blocks,
        headers,
        best_block_hash: parse_hash(raw.get("bestblockhash"), "bestblockhash")?,
        difficulty: parse_f64_required(raw.get("difficulty"), "difficulty")?,
        median_time: parse_integer_required::<u64, false>(raw.get("mediantime"), "mediantime")?,
        verification_progress,
        initial_block_download: raw.get("initialblockdownload").and_then(Value::as_bool),
        chainwork,
        size_on_disk: parse_integer_required::<u64, false>(
            raw.get("size_on_disk"),
            "size_on_disk",
        )?,
        pruned: raw
            .get("pruned")
            .and_then(Value::as_bool)
            .ok_or_else(|| CoreError::malformed("missing pruned"))?,
        warnings: parse_warnings(raw.get("warnings")),
    })
}

/// `getblockhash` returns the hash as a bare JSON string.
pub(super) fn parse_block_hash_result(raw: &Value) -> Result<BlockHash, CoreError> {
    parse_hash(Some(raw), "getblockhash result")
}

pub(super) fn parse_block(raw: &Value) -> Result<Block, CoreError> {
    let hash: BlockHash = parse_hash(raw.get("hash"), "hash")?;
    let height = BlockHeight(parse_integer_required::<u32, false>(
        raw.get("height"),
        "height",
    )?);

    let txids = raw
        .get("tx")
        .and_then(Value::as_array)
        .ok_or_else(|| CoreError::malformed(format!("block {hash}: missing tx array")))?
        .iter()
        .map(|txid| parse_hash::<Txid>(Some(txid), "tx"))
        .collect::<Result<Vec<_>, _>>()?;
    if txids.is_empty() {
        return Err(CoreError::malformed(format!(
            "block {hash}: tx array is empty"
        )));
    }

    let n_tx = parse_integer_required::<usize, false>(raw.get("nTx"), "nTx")?;
    if n_tx != txids.len() {
        return Err(CoreError::malformed(format!(
            "block {hash}: nTx is {n_tx} but tx array has {} entries",
            txids.len()
        )));
    }

    let previous_block_hash = parse_opt_hash::<BlockHash>(raw.get("previousblockhash"))?;
    if previous_block_hash.is_none() && *height != 0 {
        return Err(CoreError::malformed(format!(
            "block {hash} at height {height} has no previousblockhash"
        )));
    }

    // Bitcoin Core reports -1 for blocks that are no longer on the active chain.
    let confirmations =
        parse_integer_required::<i64, true>(raw.get("confirmations"), "confirmations")?;

    Ok(Block {
        hash,
        height,
        version: parse_integer_required::<i32, true>(raw.get("version"), "version")?,
        merkle_root: parse_hash::<TxMerkleNode>(raw.get("merkleroot"), "merkleroot")?,
        txids,
        time: parse_integer_required::<u64, false>(raw.get("time"), "time")?,
        median_time: parse_integer_required::<u64, false>(raw.get("mediantime"), "mediantime")?,
        nonce: parse_integer_required::<u32, false>(raw.get("nonce"), "nonce")?,
        bits: parse_bits(parse_str_required(raw.get("bits"), "bits")?)?,
        difficulty: parse_f64_required(raw.get("difficulty"), "difficulty")?,
        chainwork: parse_chainwork(parse_str_required(raw.get("chainwork"), "chainwork")?)?,
        n_tx,
        previous_block_hash,
        next_block_hash: parse_opt_hash::<BlockHash>(raw.get("nextblockhash"))?,
        size: parse_integer_required::<u64, false>(raw.get("size"), "size")?,
        confirmations: confirmations.max(0) as u64,
    })
}

pub(super) fn parse_transaction(raw: &Value) -> Result<Transaction, CoreError> {
    let txid: Txid = parse_hash(raw.get("txid"), "txid")?;
    let size = parse_integer_required::<u64, false>(raw.get("size"), "size")?;
    let vsize = parse_integer_required::<u64, false>(raw.get("vsize"), "vsize")?;
    let weight = parse_integer_required::<u64, false>(raw.get("weight"), "weight")?;
    if vsize > size {
        return Err(CoreError::malformed(format!(
            "transaction {txid}: vsize {vsize} exceeds size {size}"
        )));
    }
    if weight > size.saturating_mul(4) {
        return Err(CoreError::malformed(format!(
            "transaction {txid}: weight {weight} exceeds 4 * size {size}"
        )));
    }

    let vin = raw
        .get("vin")
        .and_then(Value::as_array)
        .ok_or_else(|| CoreError::malformed(format!("transaction {txid}: missing vin array")))?;
    let vout = raw
        .get("vout")
        .and_then(Value::as_array)
        .ok_or_else(|| CoreError::malformed(format!("transaction {txid}: missing vout array")))?;

    Ok(Transaction {
        txid,
        hash: parse_hash::<Wtxid>(raw.get("hash"), "hash")?,
        version: parse_integer_required::<i32, true>(raw.get("version"), "version")?,
        size,
        vsize,
        weight,
        locktime: parse_integer_required::<u32, false>(raw.get("locktime"), "locktime")?,
        inputs: parse_vin(vin)?,
        outputs: parse_vout(vout)?,
        hex: parse_str_required(raw.get("hex"), "hex")?.to_owned(),
        block_hash: parse_opt_hash::<BlockHash>(raw.get("blockhash"))?,
        confirmations: parse_integer_optional::<u64, false>(raw.get("confirmations")),
        time: parse_integer_optional::<u64, false>(raw.get("time")),
        blocktime: parse_integer_optional::<u64, false>(raw.get("blocktime")),
    })
}

pub(super) fn parse_hash_rate(raw: &Value) -> Result<f64, CoreError> {
    let rate = raw
        .as_f64()
        .ok_or_else(|| CoreError::malformed(format!("getnetworkhashps result is not a number: {raw}")))?;
    if !rate.is_finite() || rate < 0.0 {
        return Err(CoreError::malformed(format!(
            "getnetworkhashps result out of range: {rate}"
        )));
    }
    Ok(rate)
}

// ==============================================================================
// Inputs and Outputs
// ==============================================================================

pub(super) fn parse_vin(vin: &[Value]) -> Result<Vec<TxInput>, CoreError> {
    vin.iter()
        .map(|input| {
            let sequence = parse_integer_required::<u32, false>(input.get("sequence"), "sequence")?;

            if let Some(data) = input.get("coinbase") {
                let data = data
                    .as_str()
                    .ok_or_else(|| CoreError::malformed("vin.coinbase is not a string"))?;
                return Ok(TxInput::Coinbase {
                    data: data.to_owned(),
                    sequence,
                });
            }

            let prev_txid: Txid = parse_hash(input.get("txid"), "vin.txid")?;
            let prev_vout = parse_integer_required::<u32, false>(input.get("vout"), "vin.vout")?;

            let script_sig = input
                .get("scriptSig")
                .ok_or_else(|| CoreError::malformed("missing scriptSig in vin"))?;
            let script_sig = ScriptSig {
                asm: parse_str_required(script_sig.get("asm"), "scriptSig.asm")?.to_owned(),
                script: script_from_hex(parse_str_required(
                    script_sig.get("hex"),
                    "scriptSig.hex",
                )?)?,
            };

            let witness = match input.get("txinwitness") {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::Array(items)) => items
                    .iter()
                    .map(|item| {
                        item.as_str()
                            .map(str::to_owned)
                            .ok_or_else(|| CoreError::malformed("txinwitness item is not a string"))
                    })
                    .collect::<Result<_, _>>()?,
                Some(other) => {
                    return Err(CoreError::malformed(format!(
                        "txinwitness is not an array: {other}"
                    )))
                }
            };

            Ok(TxInput::Spend {
                prevout: OutPoint::new(prev_txid, prev_vout),
                script_sig,
                witness,
                sequence,
            })
        })
        .collect()
}

pub(super) fn parse_vout(vout: &[Value]) -> Result<Vec<TxOutput>, CoreError> {
    vout.iter()
        .enumerate()
        .map(|(position, output)| {
            let value = parse_btc_amount(
                output
                    .get("value")
                    .ok_or_else(|| CoreError::malformed("missing value in vout"))?,
            )?;

            let n = parse_integer_required::<u32, false>(output.get("n"), "vout.n")?;
            if n as usize != position {
                return Err(CoreError::malformed(format!(
                    "vout.n is {n} at position {position}; output indexes must be dense"
                )));
            }

            let spk = output
                .get("scriptPubKey")
                .ok_or_else(|| CoreError::malformed("missing scriptPubKey in vout"))?;

            Ok(TxOutput {
                value,
                n,
                script_pub_key: parse_script_pubkey(spk)?,
            })
        })
        .collect()
}

fn parse_script_pubkey(spk: &Value) -> Result<ScriptPubKey, CoreError> {
    let script = script_from_hex(parse_str_required(spk.get("hex"), "scriptPubKey.hex")?)?;

    // Current Core emits a single `address`; pre-22.0 nodes emit `addresses`.
    let mut addresses: Vec<String> = spk
        .get("addresses")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default();
    if let Some(address) = spk.get("address").and_then(Value::as_str) {
        if !addresses.iter().any(|a| a == address) {
            addresses.push(address.to_owned());
        }
    }

    Ok(ScriptPubKey {
        asm: spk
            .get("asm")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned(),
        script_type: classify_script(script.as_script()),
        script,
        addresses,
    })
}

fn script_from_hex(hex_str: &str) -> Result<ScriptBuf, CoreError> {
    ScriptBuf::from_hex(hex_str)
        .map_err(|e| CoreError::malformed(format!("invalid script hex: {e}")))
}

/// Parse a BTC amount from a JSON value.
///
/// Number values are parsed via `Amount::from_float_in` to support scientific
/// notation, while string values are parsed via `Amount::from_str_in`.
pub(super) fn parse_btc_amount(value: &Value) -> Result<Amount, CoreError> {
    match value {
        Value::Number(n) => {
            let parsed = n
                .as_f64()
                .ok_or_else(|| CoreError::malformed(format!("invalid BTC amount `{value}`")))?;
            Amount::from_float_in(parsed, bitcoin::Denomination::Bitcoin)
                .map_err(|e| CoreError::malformed(format!("invalid BTC amount `{value}`: {e}")))
        }
        Value::String(s) => Amount::from_str_in(s, bitcoin::Denomination::Bitcoin)
            .map_err(|e| CoreError::malformed(format!("invalid BTC amount `{s}`: {e}"))),
        _ => Err(CoreError::malformed(format!(
            "expected numeric BTC amount, got: {value}"
        ))),
    }
}

// ==============================================================================
// Field Helpers
// ==============================================================================

fn parse_hash<T>(value: Option<&Value>, field: &str) -> Result<T, CoreError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let value = value
        .and_then(Value::as_str)
        .ok_or_else(|| CoreError::malformed(format!("missing {field}")))?;
    value
        .parse()
        .map_err(|e| CoreError::malformed(format!("invalid {field} `{value}`: {e}")))
}

fn parse_opt_hash<T>(value: Option<&Value>) -> Result<Option<T>, CoreError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value.and_then(Value::as_str) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|e| CoreError::malformed(format!("invalid hash `{s}`: {e}"))),
    }
}

fn parse_str_required<'a>(value: Option<&'a Value>, field: &str) -> Result<&'a str, CoreError> {
    value
        .and_then(Value::as_str)
        .ok_or_else(|| CoreError::malformed(format!("missing {field}")))
}

fn parse_f64_required(value: Option<&Value>, field: &str) -> Result<f64, CoreError> {
    value
        .and_then(Value::as_f64)
        .ok_or_else(|| CoreError::malformed(format!("missing {field}")))
}

fn parse_chainwork(s: &str) -> Result<Chainwork, CoreError> {
    s.parse()
        .map_err(|e: crate::types::ChainworkParseError| CoreError::malformed(e.to_string()))
}

fn parse_bits(s: &str) -> Result<CompactTarget, CoreError> {
    u32::from_str_radix(s, 16)
        .map(CompactTarget::from_consensus)
        .map_err(|e| CoreError::malformed(format!("invalid bits `{s}`: {e}")))
}

/// Core < 28 reports `warnings` as a string; newer nodes send an array.
fn parse_warnings(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("; "),
        _ => String::new(),
    }
}

pub(super) fn parse_integer_required<T, const SIGNED: bool>(
    value: Option<&Value>,
    field: &str,
) -> Result<T, CoreError>
where
    T: TryFrom<i64> + TryFrom<u64>,
{
    parse_integer::<T, SIGNED, true>(value, field)?
        .ok_or_else(|| CoreError::malformed(format!("missing {field}")))
}

pub(super) fn parse_integer_optional<T, const SIGNED: bool>(value: Option<&Value>) -> Option<T>
where
    T: TryFrom<i64> + TryFrom<u64>,
{
    parse_integer::<T, SIGNED, false>(value, "value")
        .ok()
        .flatten()
}

// Generic integer parser used by all concrete numeric helpers.
// `REQUIRED=false` treats missing/null/type-mismatch as `Ok(None)`.
fn parse_integer<T, const SIGNED: bool, const REQUIRED: bool>(
    value: Option<&Value>,
    field: &str,
) -> Result<Option<T>, CoreError>
where
    T: TryFrom<i64> + TryFrom<u64>,
{
    let missing_or_none = || {
        if REQUIRED {
            Err(CoreError::malformed(format!("missing {field}")))
        } else {
            Ok(None)
        }
    };

    let Some(value) = value else {
        return missing_or_none();
    };

    if SIGNED {
        let Some(n) = value.as_i64() else {
            return missing_or_none();
        };
        T::try_from(n)
            .map(Some)
            .map_err(|_| CoreError::malformed(format!("{field} out of range: {n}")))
    } else {
        let Some(n) = value.as_u64() else {
            return missing_or_none();
        };
        T::try_from(n)
            .map(Some)
            .map_err(|_| CoreError::malformed(format!("{field} out of range: {n}")))
    }
}
