//! Hashrate telemetry
//!
//! [`StatsReporter`] is the single consumer of the workers' hash-count
//! messages. It periodically emits the interval's rate and resets its
//! counter. Nothing it does affects the outcome of a round.

/// Telemetry aggregator implementation
pub mod reporter;

// Re-export main components
pub use reporter::{HashCounter, HashRate, MiningStats, ReporterHandle, StatsReporter};
