// src/miner/worker.rs
//! Search worker
//!
//! Each worker draws random nonces and evaluates them until it finds one
//! below the target, its randomness source fails, or the round is cancelled.
//! Workers share nothing mutable; all they do is send messages.

use crate::miner::cancel::CancelToken;
use crate::miner::evaluator::{Problem, evaluate};
use crate::miner::scheduler::Solution;
use crate::utils::error::MinerError;
use crossbeam_channel::Sender;
use primitive_types::U256;
use std::sync::Arc;

/// Supplier of candidate nonces
pub trait NonceSource: Send {
    /// Draws the next candidate nonce
    ///
    /// An error here is fatal for the whole round.
    fn next_nonce(&mut self) -> Result<U256, MinerError>;
}

/// Uniform 256-bit nonces from the operating system CSPRNG
#[derive(Debug, Default, Clone, Copy)]
pub struct OsNonceSource;

impl NonceSource for OsNonceSource {
    fn next_nonce(&mut self) -> Result<U256, MinerError> {
        let mut bytes = [0u8; 32];
        getrandom::getrandom(&mut bytes)?;
        Ok(U256::from_big_endian(&bytes))
    }
}

/// Channels a worker reports into
#[derive(Clone)]
pub struct WorkerChannels {
    /// Winning nonces
    pub results: Sender<Solution>,
    /// Fatal errors
    pub errors: Sender<MinerError>,
    /// One unit per rejected candidate, if telemetry is attached
    pub hashes: Option<Sender<u64>>,
}

/// A single search worker
pub struct Worker<S: NonceSource> {
    id: usize,
    problem: Arc<Problem>,
    source: S,
    cancel: CancelToken,
    channels: WorkerChannels,
}

impl<S: NonceSource> Worker<S> {
    /// Creates a worker in the running state
    ///
    /// # Arguments
    /// * `id` - Worker index, used in logs and in the [`Solution`]
    /// * `problem` - Round problem shared by all workers
    /// * `source` - Nonce source owned by this worker
    /// * `cancel` - Token checked before every attempt
    /// * `channels` - Result, error and hash-count senders
    pub fn new(
        id: usize,
        problem: Arc<Problem>,
        source: S,
        cancel: CancelToken,
        channels: WorkerChannels,
    ) -> Self {
        Worker {
            id,
            problem,
            source,
            cancel,
            channels,
        }
    }

    /// Runs the search loop until the worker stops
    ///
    /// Returns the number of rejected candidates. At most one message is sent
    /// on either the result or the error channel.
    pub fn run(mut self) -> u64 {
        let mut rejected = 0u64;

        loop {
            if self.cancel.is_cancelled() {
                log::debug!("Worker {} cancelled after {} attempts", self.id, rejected);
                return rejected;
            }

            let nonce = match self.source.next_nonce() {
                Ok(nonce) => nonce,
                Err(e) => {
                    log::error!("Worker {} stopping: {}", self.id, e);
                    let _ = self.channels.errors.send(e);
                    return rejected;
                }
            };

            let evaluation = evaluate(&self.problem, nonce);
            if evaluation.accepted {
                log::debug!("Worker {} found nonce after {} attempts", self.id, rejected);
                let _ = self.channels.results.send(Solution {
                    nonce,
                    digest: evaluation.digest,
                    worker: self.id,
                });
                return rejected;
            }

            rejected += 1;
            if let Some(hashes) = &self.channels.hashes {
                // Telemetry is optional; a stopped aggregator is not an error
                let _ = hashes.send(1);
            }
        }
    }
}
