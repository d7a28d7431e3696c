// src/utils/mod.rs
//! Utilities module for common functionality
//!
//! Error handling and logging infrastructure shared by the search engine,
//! the node client and the command-line front end.

/// Error types and handling utilities
///
/// Contains the [`MinerError`] enum which defines every way a round can fail,
/// along with conversion implementations.
pub mod error;

/// Logging configuration and utilities
pub mod logging;

// Re-export for easier access
pub use error::MinerError;
pub use logging::{init_bench_logging, init_logging};
