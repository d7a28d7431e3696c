// src/cli/commands.rs
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// PoWERC20 Miner CLI - proof-of-work token miner in Rust
#[derive(Parser, Debug)]
#[command(name = "powerc20-miner")]
#[command(version, about, long_about = None)]
pub struct Commands {
    /// The action to perform (start mining, run a benchmark, or generate config)
    #[command(subcommand)]
    pub action: Action,
}

/// Top-level commands for the miner application
#[derive(Subcommand, Debug)]
pub enum Action {
    /// Run one mining round and submit the nonce
    Start(StartOptions),

    /// Search against random parameters and report the hashrate
    Benchmark(BenchmarkOptions),

    /// Generate configuration file template
    Config(ConfigOptions),
}

/// Options for starting a mining round
#[derive(Parser, Debug)]
pub struct StartOptions {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Number of mining workers (overrides config)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Use the [offline] parameters even when a [node] section exists
    #[arg(long)]
    pub offline: bool,

    /// Log the found nonce instead of submitting it
    #[arg(long)]
    pub dry_run: bool,
}

/// Options for the benchmark
#[derive(Parser, Debug)]
pub struct BenchmarkOptions {
    /// Difficulty level to search at
    #[arg(short = 'D', long, default_value_t = 24)]
    pub difficulty: u64,

    /// Stop after this many seconds if no nonce was found
    #[arg(short, long, default_value_t = 60)]
    pub duration: u64,

    /// Number of workers to use
    #[arg(short, long, default_value_t = num_cpus::get())]
    pub threads: usize,
}

/// Options for generating configuration files
#[derive(Parser, Debug)]
pub struct ConfigOptions {
    /// Output file path
    #[arg(short, long, default_value = "config.toml")]
    pub output: PathBuf,

    /// Include the node section
    #[arg(short, long)]
    pub node: bool,

    /// Include the offline section
    #[arg(long)]
    pub offline: bool,
}
