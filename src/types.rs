// src/types.rs
use crate::utils::error::MinerError;
use primitive_types::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Width in bytes of an account or contract address
pub const ADDRESS_LEN: usize = 20;

/// Fixed-width account identifier
///
/// Used both for the claimant (the account whose identity is bound into
/// every digest) and for the token contract being mined.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Address(pub [u8; ADDRESS_LEN]);

impl Address {
    /// Raw address bytes, in the order they are hashed
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = MinerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits)?;
        let bytes: [u8; ADDRESS_LEN] = bytes.try_into().map_err(|b: Vec<u8>| {
            MinerError::InputError(format!(
                "Address must be {} bytes, got {}",
                ADDRESS_LEN,
                b.len()
            ))
        })?;
        Ok(Address(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Parses a 256-bit unsigned integer from decimal or `0x`-prefixed hex
pub fn parse_u256(s: &str) -> Result<U256, MinerError> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x") {
        Some(digits) => U256::from_str_radix(digits, 16).ok(),
        None => U256::from_dec_str(s).ok(),
    };
    parsed.ok_or_else(|| MinerError::InputError(format!("Invalid 256-bit integer: {}", s)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_parses_with_and_without_prefix() {
        let a: Address = "0xca9b78435Be8267922E7Ac5cDE70401e7502c9cc".parse().unwrap();
        let b: Address = "ca9b78435be8267922e7ac5cde70401e7502c9cc".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "0xca9b78435be8267922e7ac5cde70401e7502c9cc");
    }

    #[test]
    fn address_rejects_wrong_width() {
        assert!("0x1234".parse::<Address>().is_err());
        assert!("0xzz9b78435be8267922e7ac5cde70401e7502c9cc".parse::<Address>().is_err());
    }

    #[test]
    fn u256_accepts_decimal_and_hex() {
        assert_eq!(parse_u256("255").unwrap(), U256::from(255u64));
        assert_eq!(parse_u256("0xff").unwrap(), U256::from(255u64));
        assert!(parse_u256("nope").is_err());
    }
}
