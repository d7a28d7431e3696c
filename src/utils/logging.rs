// src/utils/logging.rs
//! Logging configuration
//!
//! Sets up `env_logger` with a single-line format for the miner and the
//! benchmark command. Both honour `RUST_LOG` when it is set.

use env_logger::{Builder, Target};
use log::LevelFilter;
use std::env;

/// Initializes logging for a mining round
///
/// Default level is `info`, which shows round progress and one hashrate line
/// per telemetry interval.
pub fn init_logging() {
    init_with_default(LevelFilter::Info);
}

/// Initializes logging for the benchmark command
///
/// Default level is `debug` so per-worker attempt counts are visible.
pub fn init_bench_logging() {
    init_with_default(LevelFilter::Debug);
}

fn init_with_default(level: LevelFilter) {
    let mut builder = common_log_config();

    if env::var("RUST_LOG").is_err() {
        builder.filter_level(level);
    } else {
        builder.parse_env("RUST_LOG");
    }

    // A second initialisation (e.g. from tests) is harmless
    let _ = builder.try_init();
}

/// Base builder: `[timestamp LEVEL module:line] message` to stdout
fn common_log_config() -> Builder {
    let mut builder = Builder::new();

    builder
        .format(|buf, record| {
            use std::io::Write;
            let ts = buf.timestamp_seconds();
            let level = record.level();
            let module = record.module_path().unwrap_or_default();
            let line = record.line().unwrap_or(0);

            writeln!(
                buf,
                "[{} {} {}:{}] {}",
                ts,
                level,
                module,
                line,
                record.args()
            )
        })
        .target(Target::Stdout);

    builder
}
