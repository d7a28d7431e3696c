// src/miner/round.rs
//! One complete round: parameter snapshot, search, submission

use crate::miner::cancel::CancelToken;
use crate::miner::evaluator::Problem;
use crate::miner::scheduler::{Scheduler, Solution};
use crate::miner::target::compute_target;
use crate::miner::worker::OsNonceSource;
use crate::network::{Confirmation, ParameterSource, Submitter};
use crate::types::Address;
use crate::utils::error::MinerError;
use primitive_types::U256;
use std::future::Future;
use std::time::{Duration, Instant};

/// Parameters read once at the start of a round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundParameters {
    /// Round challenge
    pub challenge: U256,
    /// Difficulty level, validated when the problem is built
    pub difficulty: u64,
    /// Account the proof is bound to
    pub claimant: Address,
}

impl RoundParameters {
    /// Builds the search problem, rejecting an out-of-range difficulty
    pub fn problem(&self) -> Result<Problem, MinerError> {
        Ok(Problem {
            challenge: self.challenge,
            claimant: self.claimant,
            target: compute_target(self.difficulty)?,
        })
    }
}

/// Successful round summary
#[derive(Debug, Clone)]
pub struct RoundReport {
    /// Nonce found by the pool
    pub solution: Solution,
    /// What the submitter returned for it
    pub confirmation: Confirmation,
    /// Time spent searching
    pub search_time: Duration,
}

/// Runs one round to completion
///
/// The search runs on a blocking task so the async runtime stays free for
/// the collaborators. `cancel` may be triggered from outside (e.g. Ctrl-C)
/// to end the search early. The submitter is called exactly once, and only
/// after a nonce was found.
///
/// # Arguments
/// * `source` - Where the challenge, difficulty and claimant come from
/// * `submitter` - Receives the winning nonce
/// * `scheduler` - Worker pool settings
/// * `cancel` - Token shared with every search worker
///
/// # Returns
/// * `Ok(RoundReport)` - The nonce was found and accepted by the submitter
/// * `Err(MinerError)` - The first failure of any stage, or `Cancelled`
pub async fn run_round<P, S>(
    source: &P,
    submitter: &S,
    scheduler: &Scheduler,
    cancel: &CancelToken,
) -> Result<RoundReport, MinerError>
where
    P: ParameterSource,
    S: Submitter,
{
    let params = source.snapshot().await?;
    log::info!("Current mining challenge number: {}", params.challenge);
    log::info!("Current mining difficulty level: {}", params.difficulty);

    let problem = params.problem()?;
    log::info!("Target number is: {}", problem.target);

    let scheduler = scheduler.clone();
    let token = cancel.clone();
    let started = Instant::now();
    let solution = tokio::task::spawn_blocking(move || {
        scheduler.run_search_with(&problem, &token, |_| OsNonceSource)
    })
    .await??;
    let search_time = started.elapsed();

    log::info!("Submitting mining transaction with nonce {}", solution.nonce);
    let confirmation = submitter.submit(solution.nonce).await?;
    log::info!("Mining transaction confirmed: {}", confirmation);

    Ok(RoundReport {
        solution,
        confirmation,
        search_time,
    })
}

/// Drives `work` until it finishes or `interrupt` resolves
///
/// An interrupt at any stage (parameter fetch, search, confirmation wait)
/// cancels `cancel`, so blocking workers stop too, and drops `work`.
///
/// # Arguments
/// * `work` - The round, or anything else that should stop on interrupt
/// * `interrupt` - Resolves when the user asks to stop
/// * `cancel` - Token handed to the search workers inside `work`
///
/// # Returns
/// * The output of `work` if it completes first
/// * `Err(MinerError::Cancelled)` if `interrupt` resolves first
pub async fn until_interrupted<T, W, I>(
    work: W,
    interrupt: I,
    cancel: &CancelToken,
) -> Result<T, MinerError>
where
    W: Future<Output = Result<T, MinerError>>,
    I: Future<Output = ()>,
{
    tokio::select! {
        outcome = work => outcome,
        _ = interrupt => {
            log::warn!("Interrupted, stopping the round");
            cancel.cancel();
            Err(MinerError::Cancelled)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::miner::evaluator::evaluate;
    use crate::network::StaticParameters;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        submitted: Mutex<Vec<U256>>,
        fail: bool,
    }

    impl Submitter for Recording {
        async fn submit(&self, nonce: U256) -> Result<Confirmation, MinerError> {
            self.submitted.lock().unwrap().push(nonce);
            if self.fail {
                return Err(MinerError::SubmissionError("rejected by contract".into()));
            }
            Ok(Confirmation {
                handle: "0xfeed".into(),
                block_number: Some(1),
            })
        }
    }

    fn params(difficulty: u64) -> StaticParameters {
        StaticParameters {
            challenge: U256::from(123_456u64),
            difficulty,
            claimant: Address([9; 20]),
        }
    }

    fn scheduler() -> Scheduler {
        Scheduler::new(2, Duration::from_secs(1)).unwrap()
    }

    #[tokio::test]
    async fn submits_found_nonce_once() {
        let source = params(6);
        let submitter = Recording::default();
        let report = run_round(&source, &submitter, &scheduler(), &CancelToken::new())
            .await
            .unwrap();

        let submitted = submitter.submitted.lock().unwrap().clone();
        assert_eq!(submitted, vec![report.solution.nonce]);
        assert_eq!(report.confirmation.handle, "0xfeed");

        // The nonce really is below the target for this claimant
        let problem = source.snapshot().await.unwrap().problem().unwrap();
        assert!(evaluate(&problem, report.solution.nonce).accepted);
    }

    #[tokio::test]
    async fn invalid_difficulty_fails_before_searching() {
        let submitter = Recording::default();
        let result = run_round(&params(300), &submitter, &scheduler(), &CancelToken::new()).await;
        assert!(matches!(result, Err(MinerError::ConfigError(_))));
        assert!(submitter.submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn submission_failure_ends_the_round() {
        let submitter = Recording {
            fail: true,
            ..Default::default()
        };
        let result = run_round(&params(0), &submitter, &scheduler(), &CancelToken::new()).await;
        assert!(matches!(result, Err(MinerError::SubmissionError(_))));
        assert_eq!(submitter.submitted.lock().unwrap().len(), 1);
    }

    /// Never confirms, like a transaction stuck in the mempool
    struct Stalled;

    impl Submitter for Stalled {
        async fn submit(&self, _nonce: U256) -> Result<Confirmation, MinerError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn interrupt_during_submission_ends_the_round() {
        let cancel = CancelToken::new();
        let params = params(0);
        let scheduler = scheduler();
        let round = run_round(&params, &Stalled, &scheduler, &cancel);
        let interrupt = tokio::time::sleep(Duration::from_millis(200));

        let result = until_interrupted(round, interrupt, &cancel).await;
        assert!(matches!(result, Err(MinerError::Cancelled)));
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn interrupt_during_search_stops_workers() {
        let cancel = CancelToken::new();
        let submitter = Recording::default();
        let params = params(256);
        let scheduler = scheduler();
        let round = run_round(&params, &submitter, &scheduler, &cancel);
        let interrupt = tokio::time::sleep(Duration::from_millis(100));

        let result = until_interrupted(round, interrupt, &cancel).await;
        assert!(matches!(result, Err(MinerError::Cancelled)));
        assert!(cancel.is_cancelled());
        assert!(submitter.submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn finished_round_is_not_interrupted() {
        let cancel = CancelToken::new();
        let submitter = Recording::default();
        let params = params(0);
        let scheduler = scheduler();
        let round = run_round(&params, &submitter, &scheduler, &cancel);

        let report = until_interrupted(round, std::future::pending(), &cancel)
            .await
            .unwrap();
        assert_eq!(report.confirmation.handle, "0xfeed");
        assert_eq!(submitter.submitted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn cancelled_round_never_submits() {
        let submitter = Recording::default();
        let cancel = CancelToken::new();
        cancel.cancel();
        let result = run_round(&params(256), &submitter, &scheduler(), &cancel).await;
        assert!(matches!(result, Err(MinerError::Cancelled)));
        assert!(submitter.submitted.lock().unwrap().is_empty());
    }
}
