// src/network/mod.rs
//! External collaborators of a mining round
//!
//! A round reads its parameters from a [`ParameterSource`] once, before any
//! worker starts, and hands the winning nonce to a [`Submitter`] exactly once.
//! [`NodeClient`] implements both against an Ethereum JSON-RPC endpoint;
//! [`StaticParameters`] and [`DryRunSubmitter`] serve offline runs.

/// Contract call encoding and return-data decoding
pub mod abi;

/// JSON-RPC node client
pub mod node;

/// Local transaction signing
pub mod signer;

pub use node::{NodeClient, NodeConfig};
pub use signer::{LegacyTransaction, LocalSigner, PrivateKey};

use crate::miner::round::RoundParameters;
use crate::types::Address;
use crate::utils::error::MinerError;
use primitive_types::U256;
use std::fmt;
use std::future::Future;

/// Supplier of the round's challenge, difficulty and claimant
pub trait ParameterSource: Send + Sync {
    /// Current challenge published by the contract
    fn challenge(&self) -> impl Future<Output = Result<U256, MinerError>> + Send;

    /// Current difficulty level
    fn difficulty(&self) -> impl Future<Output = Result<u64, MinerError>> + Send;

    /// Account the proof is bound to
    fn claimant(&self) -> Address;

    /// Reads all three values once as the round's immutable snapshot
    fn snapshot(&self) -> impl Future<Output = Result<RoundParameters, MinerError>> + Send {
        async move {
            let challenge = self.challenge().await?;
            let difficulty = self.difficulty().await?;
            Ok(RoundParameters {
                challenge,
                difficulty,
                claimant: self.claimant(),
            })
        }
    }
}

/// Receipt of a successful submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    /// Transaction hash or other handle identifying the submission
    pub handle: String,
    /// Block the submission was included in, when known
    pub block_number: Option<u64>,
}

impl fmt::Display for Confirmation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.block_number {
            Some(block) => write!(f, "{} (block {})", self.handle, block),
            None => write!(f, "{}", self.handle),
        }
    }
}

/// Accepts a discovered nonce on behalf of the claimant
pub trait Submitter: Send + Sync {
    /// Submits `nonce`; failures are terminal for the round
    fn submit(&self, nonce: U256) -> impl Future<Output = Result<Confirmation, MinerError>> + Send;
}

/// Fixed round parameters, for benchmarks and offline runs
#[derive(Debug, Clone)]
pub struct StaticParameters {
    /// Challenge to search against
    pub challenge: U256,
    /// Difficulty level
    pub difficulty: u64,
    /// Claimant bound into the digest
    pub claimant: Address,
}

impl ParameterSource for StaticParameters {
    async fn challenge(&self) -> Result<U256, MinerError> {
        Ok(self.challenge)
    }

    async fn difficulty(&self) -> Result<u64, MinerError> {
        Ok(self.difficulty)
    }

    fn claimant(&self) -> Address {
        self.claimant
    }
}

/// Logs the nonce instead of submitting it
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunSubmitter;

impl Submitter for DryRunSubmitter {
    async fn submit(&self, nonce: U256) -> Result<Confirmation, MinerError> {
        log::info!("Dry run: not submitting nonce {}", nonce);
        Ok(Confirmation {
            handle: "dry-run".to_string(),
            block_number: None,
        })
    }
}
