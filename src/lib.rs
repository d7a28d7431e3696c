//! PoWERC20 Miner - proof-of-work token miner in Rust
//!
//! Searches for a nonce such that
//! `keccak256(challenge || claimant || nonce)` falls below
//! `2^(256 - difficulty)`, using a pool of workers that draw random nonces
//! and race to the first valid one. Provides:
//! - The concurrent search engine with cooperative cancellation
//! - Hashrate telemetry aggregated over a single channel
//! - A JSON-RPC client that reads round parameters and submits the nonce,
//!   signing the transaction locally when a key is configured
//! - A command-line front end with TOML configuration

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Search engine: target, evaluator, workers, coordinator, round driver
pub mod miner;

/// Parameter source and submitter collaborators
pub mod network;

/// Hashrate telemetry
pub mod stats;

/// Utility functions and error handling
pub mod utils;

/// Command-line interface definitions
pub mod cli;

/// Configuration management
pub mod config;

/// Shared type definitions
pub mod types;

// Core exports
pub use cli::Commands;
pub use config::Config;
pub use miner::{CancelToken, Problem, Scheduler, Solution, Target, Worker, compute_target};
pub use network::{Confirmation, NodeClient, ParameterSource, Submitter};
pub use stats::{HashRate, MiningStats, StatsReporter};
pub use types::Address;
pub use utils::{MinerError, init_logging};
