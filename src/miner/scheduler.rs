// src/miner/scheduler.rs
//! Worker pool coordinator
//!
//! Spawns a fixed number of workers against one problem, waits for the
//! first winning nonce or the first fatal error, cancels the remaining
//! workers and waits for all of them to stop before returning.

use crate::miner::cancel::CancelToken;
use crate::miner::evaluator::Problem;
use crate::miner::worker::{NonceSource, OsNonceSource, Worker, WorkerChannels};
use crate::stats::StatsReporter;
use crate::utils::error::MinerError;
use crossbeam_channel::{Sender, select};
use primitive_types::U256;
use std::sync::Arc;
use std::time::Duration;

/// Winning nonce reported by a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Solution {
    /// Nonce whose digest fell below the target
    pub nonce: U256,
    /// Digest the worker computed for the nonce
    pub digest: U256,
    /// Index of the worker that found it
    pub worker: usize,
}

/// Coordinates search workers for one round at a time
#[derive(Debug, Clone)]
pub struct Scheduler {
    /// Number of workers spawned per round
    workers: usize,
    /// Hashrate reporting interval
    report_interval: Duration,
}

impl Scheduler {
    /// Creates a new Scheduler
    ///
    /// # Arguments
    /// * `workers` - Number of search threads per round (at least 1)
    /// * `report_interval` - Period of the hashrate samples
    ///
    /// # Returns
    /// * `Ok(Scheduler)` - Ready to run rounds
    /// * `Err(MinerError::ConfigError)` - If `workers` is zero
    pub fn new(workers: usize, report_interval: Duration) -> Result<Self, MinerError> {
        if workers == 0 {
            return Err(MinerError::ConfigError(
                "Worker count must be at least 1".to_string(),
            ));
        }
        Ok(Scheduler {
            workers,
            report_interval,
        })
    }

    /// Number of workers spawned per round
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs one search round with OS randomness and live telemetry
    ///
    /// # Arguments
    /// * `problem` - Challenge, claimant and target of the round
    ///
    /// # Returns
    /// * `Ok(Solution)` - The first accepted nonce
    /// * `Err(MinerError)` - The first worker failure
    pub fn run_search(&self, problem: &Problem) -> Result<Solution, MinerError> {
        self.run_search_with(problem, &CancelToken::new(), |_| OsNonceSource)
    }

    /// Runs one search round with a caller-supplied token and nonce sources
    ///
    /// Cancelling `cancel` from another thread ends the round with
    /// [`MinerError::Cancelled`]. The token is cancelled when the round ends,
    /// whatever the outcome.
    ///
    /// # Arguments
    /// * `problem` - Challenge, claimant and target of the round
    /// * `cancel` - Token shared with every worker
    /// * `make_source` - Builds the nonce source for worker `id`
    ///
    /// # Returns
    /// * `Ok(Solution)` - The first accepted nonce
    /// * `Err(MinerError)` - The first worker failure, or `Cancelled`
    pub fn run_search_with<S, F>(
        &self,
        problem: &Problem,
        cancel: &CancelToken,
        make_source: F,
    ) -> Result<Solution, MinerError>
    where
        S: NonceSource + 'static,
        F: FnMut(usize) -> S,
    {
        let reporter = StatsReporter::new(self.report_interval).start();
        let outcome = self.race(problem, cancel, make_source, Some(reporter.hash_sender()));
        let stats = reporter.stop();

        log::info!(
            "Round finished after {} hashes in {:.1}s ({:.2} K/s average)",
            stats.hashes_total,
            stats.elapsed.as_secs_f64(),
            stats.avg_hashrate() / 1000.0
        );

        outcome
    }

    /// Spawns the workers and returns the first terminal outcome
    ///
    /// When this returns every worker has stopped and dropped its clone of
    /// `hashes`, so no further hash-count messages can arrive.
    ///
    /// A result and an error arriving together are resolved by whichever
    /// `select!` observes first; neither has priority.
    ///
    /// # Arguments
    /// * `problem` - Challenge, claimant and target of the round
    /// * `cancel` - Token shared with every worker
    /// * `make_source` - Builds the nonce source for worker `id`
    /// * `hashes` - Where workers report rejected attempts, if anywhere
    pub fn race<S, F>(
        &self,
        problem: &Problem,
        cancel: &CancelToken,
        mut make_source: F,
        hashes: Option<Sender<u64>>,
    ) -> Result<Solution, MinerError>
    where
        S: NonceSource + 'static,
        F: FnMut(usize) -> S,
    {
        // Each worker sends at most one terminal message, so these never block
        let (result_tx, result_rx) = crossbeam_channel::bounded(self.workers);
        let (error_tx, error_rx) = crossbeam_channel::bounded(self.workers);
        let problem = Arc::new(problem.clone());

        log::info!("Starting {} mining workers", self.workers);

        let mut handles = Vec::with_capacity(self.workers);
        for id in 0..self.workers {
            let worker = Worker::new(
                id,
                problem.clone(),
                make_source(id),
                cancel.clone(),
                WorkerChannels {
                    results: result_tx.clone(),
                    errors: error_tx.clone(),
                    hashes: hashes.clone(),
                },
            );

            let spawned = std::thread::Builder::new()
                .name(format!("miner-{}", id))
                .spawn(move || worker.run());

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    // Workers already running must not outlive the round
                    let _ = error_tx.send(MinerError::IoError(e));
                    break;
                }
            }
        }

        // Only workers hold senders now; all of them gone means all stopped
        drop(result_tx);
        drop(error_tx);
        drop(hashes);

        // A disconnected channel means every worker has exited, so whatever
        // terminal message exists is already buffered on the other one
        let exited = || {
            if cancel.is_cancelled() {
                MinerError::Cancelled
            } else {
                MinerError::ChannelError("All workers exited without a result".to_string())
            }
        };
        let outcome = select! {
            recv(result_rx) -> msg => match msg {
                Ok(solution) => Ok(solution),
                Err(_) => Err(error_rx.try_recv().unwrap_or_else(|_| exited())),
            },
            recv(error_rx) -> msg => match msg {
                Ok(e) => Err(e),
                Err(_) => result_rx.try_recv().map_err(|_| exited()),
            },
            recv(cancel.signal()) -> _ => Err(MinerError::Cancelled),
        };

        cancel.cancel();
        for handle in handles {
            match handle.join() {
                Ok(attempts) => log::debug!("Worker joined after {} rejected attempts", attempts),
                Err(_) => log::error!("Mining worker panicked"),
            }
        }

        match &outcome {
            Ok(solution) => log::info!(
                "Worker {} discovered a valid nonce: {}",
                solution.worker,
                solution.nonce
            ),
            Err(e) => log::warn!("Search ended without a nonce: {}", e),
        }

        outcome
    }
}
