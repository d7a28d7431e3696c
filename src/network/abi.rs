// src/network/abi.rs
//! Minimal contract ABI encoding for the token calls the miner makes

use crate::miner::evaluator::keccak256;
use crate::utils::error::MinerError;
use primitive_types::U256;

/// Size of one ABI word
const WORD: usize = 32;

/// First four bytes of the Keccak-256 hash of a function signature
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Call data for `signature` with static uint256 arguments
pub fn encode_call(signature: &str, args: &[U256]) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + WORD * args.len());
    data.extend_from_slice(&selector(signature));
    for arg in args {
        let mut word = [0u8; WORD];
        arg.to_big_endian(&mut word);
        data.extend_from_slice(&word);
    }
    data
}

/// `0x`-prefixed lowercase hex
pub fn to_hex(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

/// Decodes `0x`-prefixed (or bare) hex data
pub fn from_hex(s: &str) -> Result<Vec<u8>, MinerError> {
    Ok(hex::decode(s.strip_prefix("0x").unwrap_or(s))?)
}

/// Parses a JSON-RPC hex quantity such as `0x1a`
pub fn parse_quantity(s: &str) -> Result<u64, MinerError> {
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| MinerError::ProtocolError(format!("Quantity without 0x prefix: {}", s)))?;
    u64::from_str_radix(digits, 16)
        .map_err(|e| MinerError::ProtocolError(format!("Invalid quantity {}: {}", s, e)))
}

fn word(data: &[u8], index: usize) -> Result<&[u8], MinerError> {
    data.get(index..index + WORD).ok_or_else(|| {
        MinerError::ProtocolError(format!(
            "Return data too short: need {} bytes, got {}",
            index + WORD,
            data.len()
        ))
    })
}

/// Decodes a single uint256 return value
pub fn decode_u256(data: &[u8]) -> Result<U256, MinerError> {
    Ok(U256::from_big_endian(word(data, 0)?))
}

fn decode_usize(data: &[u8], index: usize) -> Result<usize, MinerError> {
    let value = U256::from_big_endian(word(data, index)?);
    if value > U256::from(data.len()) {
        return Err(MinerError::ProtocolError(format!(
            "ABI offset or length {} exceeds return data",
            value
        )));
    }
    Ok(value.as_usize())
}

/// Decodes a single dynamic `string` return value
pub fn decode_string(data: &[u8]) -> Result<String, MinerError> {
    let offset = decode_usize(data, 0)?;
    let len = decode_usize(data, offset)?;
    let start = offset + WORD;
    let bytes = data.get(start..start + len).ok_or_else(|| {
        MinerError::ProtocolError("String extends past return data".to_string())
    })?;
    String::from_utf8(bytes.to_vec())
        .map_err(|e| MinerError::ProtocolError(format!("String is not UTF-8: {}", e)))
}
