// src/main.rs
use clap::Parser;
use powerc20_miner::config::RoundSource;
use powerc20_miner::miner::{
    CancelToken, NonceSource, OsNonceSource, RoundParameters, RoundReport, run_round, until_interrupted,
};
use powerc20_miner::network::DryRunSubmitter;
use powerc20_miner::utils::init_bench_logging;
use powerc20_miner::*;
use std::time::Duration;
use tokio::runtime::Runtime;

/// Main entry point for the miner
///
/// # Returns
/// - `Ok(())` on successful execution
/// - `Err(MinerError)` if the round or any setup step fails
fn main() -> Result<(), MinerError> {
    let cli = cli::Commands::parse();

    match cli.action {
        cli::Action::Start(opts) => start_mining(opts),
        cli::Action::Benchmark(opts) => run_benchmark(opts),
        cli::Action::Config(opts) => generate_config(opts),
    }
}

/// Runs one mining round with the given options
///
/// # Operations
/// 1. Initializes logging
/// 2. Loads, overrides and validates configuration
/// 3. Connects to the node (or uses offline parameters)
/// 4. Searches for a nonce and submits it, stopping early on Ctrl-C
fn start_mining(opts: cli::StartOptions) -> Result<(), MinerError> {
    utils::init_logging();

    let mut config = config::load(&opts.config)?;
    if let Some(workers) = opts.workers {
        config.worker_count = workers;
    }
    config.validate()?;

    let scheduler = Scheduler::new(config.worker_count, config.report_interval())?;
    let cancel = CancelToken::new();

    let rt = Runtime::new()?;
    let report = rt.block_on(until_interrupted(
        mine_once(&config, &opts, &scheduler, &cancel),
        interrupted(),
        &cancel,
    ))?;

    log::info!(
        "Mining process successfully completed in {:.1}s: nonce {} -> {}",
        report.search_time.as_secs_f64(),
        report.solution.nonce,
        report.confirmation
    );
    Ok(())
}

/// Connects to the configured parameter source and runs one round
///
/// # Arguments
/// * `config` - Validated configuration
/// * `opts` - Command line options of `start`
/// * `scheduler` - Worker pool settings
/// * `cancel` - Token the search workers observe
///
/// # Returns
/// * `Ok(RoundReport)` - The round found and submitted a nonce
/// * `Err(MinerError)` - Source selection, connection, search or submission failed
async fn mine_once(
    config: &Config,
    opts: &cli::StartOptions,
    scheduler: &Scheduler,
    cancel: &CancelToken,
) -> Result<RoundReport, MinerError> {
    match config.round_source(opts.offline)? {
        RoundSource::Node(node_cfg) => {
            log::info!("Establishing connection with Ethereum client...");
            let client = NodeClient::new(node_cfg.clone())?;
            let chain_id = client.chain_id().await?;
            log::info!("Connected to Ethereum network with Chain ID: {}", chain_id);
            let name = client.token_name().await?;
            log::info!("Contract Name: {}", name);

            if opts.dry_run {
                run_round(&client, &DryRunSubmitter, scheduler, cancel).await
            } else {
                run_round(&client, &client, scheduler, cancel).await
            }
        }
        RoundSource::Offline(offline) => {
            let params = offline.parameters()?;
            log::info!("Using offline parameters; the nonce will not be submitted");
            run_round(&params, &DryRunSubmitter, scheduler, cancel).await
        }
    }
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("Unable to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Searches against a random challenge to measure throughput
///
/// The round stops at the first nonce or after `opts.duration` seconds,
/// whichever comes first.
fn run_benchmark(opts: cli::BenchmarkOptions) -> Result<(), MinerError> {
    init_bench_logging();

    let problem = RoundParameters {
        challenge: OsNonceSource.next_nonce()?,
        difficulty: opts.difficulty,
        claimant: Address::default(),
    }
    .problem()?;
    let scheduler = Scheduler::new(opts.threads, Duration::from_secs(1))?;

    log::info!(
        "Starting benchmark at difficulty {} with {} workers for up to {} seconds",
        opts.difficulty,
        opts.threads,
        opts.duration
    );

    let cancel = CancelToken::new();
    let timer = {
        let cancel = cancel.clone();
        let limit = Duration::from_secs(opts.duration);
        std::thread::spawn(move || {
            // Returns early once the round itself cancels the token
            if cancel.signal().recv_timeout(limit).is_err() && !cancel.is_cancelled() {
                cancel.cancel();
            }
        })
    };

    let started = std::time::Instant::now();
    let outcome = scheduler.run_search_with(&problem, &cancel, |_| OsNonceSource);
    let _ = timer.join();

    match outcome {
        Ok(solution) => log::info!(
            "Found nonce {} in {:.2}s",
            solution.nonce,
            started.elapsed().as_secs_f64()
        ),
        Err(MinerError::Cancelled) => log::info!(
            "No nonce found within {} seconds",
            opts.duration
        ),
        Err(e) => return Err(e),
    }

    Ok(())
}

/// Writes a configuration template to the requested file
fn generate_config(opts: cli::ConfigOptions) -> Result<(), MinerError> {
    let config = config::generate_template(opts.node, opts.offline);
    std::fs::write(opts.output, config)?;
    Ok(())
}
