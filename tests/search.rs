use crossbeam_channel::TryRecvError;
use powerc20_miner::miner::{
    CancelToken, NonceSource, OsNonceSource, Problem, Scheduler, Target, compute_target, evaluate,
};
use powerc20_miner::{Address, MinerError};
use primitive_types::U256;
use std::time::Duration;

fn problem(difficulty: u64) -> Problem {
    Problem {
        challenge: U256::from_dec_str("98765432109876543210").unwrap(),
        claimant: "0xca9b78435be8267922e7ac5cde70401e7502c9cc".parse::<Address>().unwrap(),
        target: compute_target(difficulty).unwrap(),
    }
}

fn scheduler(workers: usize) -> Scheduler {
    Scheduler::new(workers, Duration::from_millis(100)).unwrap()
}

/// Either real randomness or a source that always fails
enum Mixed {
    Os,
    Broken,
}

impl NonceSource for Mixed {
    fn next_nonce(&mut self) -> Result<U256, MinerError> {
        match self {
            Mixed::Os => OsNonceSource.next_nonce(),
            Mixed::Broken => Err(MinerError::RandomnessError("device unavailable".into())),
        }
    }
}

#[test]
fn difficulty_zero_single_worker_finds_on_first_attempt() {
    let (tx, rx) = crossbeam_channel::unbounded();
    let solution = scheduler(1)
        .race(&problem(0), &CancelToken::new(), |_| OsNonceSource, Some(tx))
        .unwrap();

    assert_eq!(solution.worker, 0);
    assert_eq!(rx.try_iter().count(), 0);
}

#[test]
fn found_nonce_is_below_target() {
    let p = problem(10);
    let solution = scheduler(4).run_search(&p).unwrap();
    let evaluation = evaluate(&p, solution.nonce);
    assert!(evaluation.accepted);
    assert_eq!(evaluation.digest, solution.digest);
}

#[test]
fn max_difficulty_produces_no_false_acceptance() {
    let p = problem(256);
    assert_eq!(p.target, Target::Below(U256::one()));

    let cancel = CancelToken::new();
    let timer = {
        let cancel = cancel.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(200));
            cancel.cancel();
        })
    };

    let (tx, rx) = crossbeam_channel::unbounded();
    let outcome = scheduler(8).race(&p, &cancel, |_| OsNonceSource, Some(tx));
    timer.join().unwrap();

    match outcome {
        Ok(solution) => assert!(solution.digest.is_zero()),
        Err(e) => assert!(matches!(e, MinerError::Cancelled)),
    }
    // Work was actually done before the cancellation
    assert!(rx.try_iter().count() > 0);
}

#[test]
fn no_hash_counts_after_search_returns() {
    let (tx, rx) = crossbeam_channel::unbounded();
    scheduler(6)
        .race(&problem(12), &CancelToken::new(), |_| OsNonceSource, Some(tx))
        .unwrap();

    // Every worker has stopped and dropped its sender
    rx.try_iter().for_each(drop);
    assert_eq!(rx.try_recv(), Err(TryRecvError::Disconnected));
}

#[test]
fn many_simultaneous_winners_yield_one_result() {
    for workers in [2, 8, 32] {
        let p = problem(0);
        let solution = scheduler(workers).run_search(&p).unwrap();
        assert!(solution.worker < workers);
        assert!(evaluate(&p, solution.nonce).accepted);
    }
}

#[test]
fn result_error_race_yields_exactly_one_outcome() {
    for _ in 0..20 {
        let outcome = scheduler(8).run_search_with(&problem(0), &CancelToken::new(), |id| {
            if id % 2 == 0 { Mixed::Os } else { Mixed::Broken }
        });
        match outcome {
            Ok(solution) => assert_eq!(solution.worker % 2, 0),
            Err(e) => assert!(matches!(e, MinerError::RandomnessError(_))),
        }
    }
}

#[test]
fn randomness_failure_is_fatal_for_the_round() {
    let outcome = scheduler(4).run_search_with(&problem(255), &CancelToken::new(), |id| {
        if id == 3 { Mixed::Broken } else { Mixed::Os }
    });
    assert!(matches!(outcome, Err(MinerError::RandomnessError(_))));
}
