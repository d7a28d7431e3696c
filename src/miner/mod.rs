// src/miner/mod.rs
//! Core mining functionality
//!
//! This module contains the proof-of-work search engine:
//! - Difficulty to target conversion
//! - Candidate hashing and acceptance
//! - Search workers and the pool coordinator that races them
//! - The round driver tying the search to its collaborators

/// Cooperative cancellation token
pub mod cancel;

/// Candidate encoding and Keccak-256 evaluation
pub mod evaluator;

/// Round driver: snapshot, search, submit
pub mod round;

/// Worker pool coordinator
///
/// Spawns the workers for one round, waits for the first terminal outcome
/// and cancels the rest.
pub mod scheduler;

/// Difficulty to target conversion
pub mod target;

/// Search worker loop and nonce sources
pub mod worker;

// Re-export main components for cleaner imports
pub use self::cancel::CancelToken;
pub use self::evaluator::{Evaluation, Problem, evaluate};
pub use self::round::{RoundParameters, RoundReport, run_round, until_interrupted};
pub use self::scheduler::{Scheduler, Solution};
pub use self::target::{Target, compute_target};
pub use self::worker::{NonceSource, OsNonceSource, Worker};
