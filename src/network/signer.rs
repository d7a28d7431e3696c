// src/network/signer.rs
//! Local signing of the `mine` transaction
//!
//! Builds legacy transactions with EIP-155 replay protection and signs them
//! with a secp256k1 key held by the miner, so the node only has to relay the
//! raw bytes (`eth_sendRawTransaction`).

use crate::miner::evaluator::keccak256;
use crate::types::{ADDRESS_LEN, Address};
use crate::utils::error::MinerError;
use primitive_types::U256;
use rlp::RlpStream;
use secp256k1::{All, Message, PublicKey, Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hex-encoded private key as written in the config file
///
/// `Debug` never prints the key.
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrivateKey(pub String);

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

/// Unsigned legacy transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTransaction {
    /// Sender account nonce
    pub nonce: u64,
    /// Price per gas unit in wei
    pub gas_price: U256,
    /// Gas limit
    pub gas_limit: u64,
    /// Recipient (the token contract)
    pub to: Address,
    /// Wei transferred with the call
    pub value: U256,
    /// Call data
    pub data: Vec<u8>,
    /// Chain the signature is bound to
    pub chain_id: u64,
}

/// Recoverable signature in transaction form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxSignature {
    /// `recovery id + 35 + 2 * chain_id`
    pub v: u64,
    /// Signature `r`
    pub r: U256,
    /// Signature `s`
    pub s: U256,
}

impl LegacyTransaction {
    fn fields(&self) -> RlpStream {
        let mut stream = RlpStream::new_list(9);
        stream.append(&self.nonce);
        stream.append(&self.gas_price);
        stream.append(&self.gas_limit);
        stream.append(&self.to.as_bytes().to_vec());
        stream.append(&self.value);
        stream.append(&self.data);
        stream
    }

    /// RLP list that is hashed for signing: the six fields, then
    /// `chain_id, 0, 0`
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut stream = self.fields();
        stream.append(&self.chain_id);
        stream.append(&0u8);
        stream.append(&0u8);
        stream.out().to_vec()
    }

    /// Keccak-256 of [`signing_payload`](Self::signing_payload)
    pub fn signing_hash(&self) -> [u8; 32] {
        keccak256(&self.signing_payload())
    }

    /// Raw transaction bytes for `eth_sendRawTransaction`
    pub fn encode_signed(&self, signature: &TxSignature) -> Vec<u8> {
        let mut stream = self.fields();
        stream.append(&signature.v);
        stream.append(&signature.r);
        stream.append(&signature.s);
        stream.out().to_vec()
    }
}

/// Holds the miner's key and signs transactions with it
pub struct LocalSigner {
    secp: Secp256k1<All>,
    secret: SecretKey,
    address: Address,
}

impl fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl LocalSigner {
    /// Creates a signer from a hex private key
    ///
    /// # Arguments
    /// * `key` - 32-byte secret key, hex with or without `0x`
    ///
    /// # Returns
    /// * `Ok(LocalSigner)` - Signer for the derived account
    /// * `Err(MinerError)` - If the key is not valid hex or not a valid
    ///   secp256k1 scalar
    pub fn from_hex(key: &str) -> Result<Self, MinerError> {
        let bytes = hex::decode(key.trim().trim_start_matches("0x"))?;
        let secp = Secp256k1::new();
        let secret = SecretKey::from_slice(&bytes)?;
        let address = public_key_address(&PublicKey::from_secret_key(&secp, &secret));
        Ok(LocalSigner {
            secp,
            secret,
            address,
        })
    }

    /// Account derived from the key
    pub fn address(&self) -> Address {
        self.address
    }

    /// Signs the transaction's EIP-155 hash
    pub fn sign_transaction(&self, tx: &LegacyTransaction) -> Result<TxSignature, MinerError> {
        let message = Message::from_slice(&tx.signing_hash())?;
        let (recovery_id, compact) = self
            .secp
            .sign_ecdsa_recoverable(&message, &self.secret)
            .serialize_compact();

        Ok(TxSignature {
            v: recovery_id.to_i32() as u64 + 35 + 2 * tx.chain_id,
            r: U256::from_big_endian(&compact[..32]),
            s: U256::from_big_endian(&compact[32..]),
        })
    }

    /// Signs and encodes the transaction in one step
    pub fn sign_raw(&self, tx: &LegacyTransaction) -> Result<Vec<u8>, MinerError> {
        let signature = self.sign_transaction(tx)?;
        Ok(tx.encode_signed(&signature))
    }
}

/// Ethereum address: last 20 bytes of Keccak-256 over the uncompressed key
/// without its `0x04` prefix
fn public_key_address(key: &PublicKey) -> Address {
    let hash = keccak256(&key.serialize_uncompressed()[1..]);
    let mut address = [0u8; ADDRESS_LEN];
    address.copy_from_slice(&hash[32 - ADDRESS_LEN..]);
    Address(address)
}
