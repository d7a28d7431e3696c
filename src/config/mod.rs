// src/config/mod.rs
//! Configuration management for the miner
//!
//! Loads the TOML configuration, validates it, and generates commented
//! templates. A loaded [`Config`] is immutable for the rest of the run.

/// Core configuration implementation
pub mod config;

// Re-export key items for easy access
pub use config::{Config, OfflineConfig, RoundSource};

use crate::utils::error::MinerError;
use std::path::PathBuf;

/// Loads miner configuration from a TOML file
pub fn load(path: impl Into<PathBuf>) -> Result<Config, MinerError> {
    Config::load(path)
}

/// Generates a commented configuration template
///
/// # Arguments
/// * `node` - Whether to include the node section
/// * `offline` - Whether to include the offline section
pub fn generate_template(node: bool, offline: bool) -> String {
    Config::generate_template(node, offline)
}
