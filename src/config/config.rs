// src/config/config.rs
use crate::{
    network::{StaticParameters, node::NodeConfig},
    types::{Address, parse_u256},
    utils::error::MinerError,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for the mining application
///
/// Built once at startup (file plus CLI overrides), validated, and then only
/// passed around by reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Number of concurrent search workers
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Seconds between hashrate reports
    #[serde(default = "default_report_interval_secs")]
    pub report_interval_secs: u64,

    /// Token contract reached through a JSON-RPC node
    #[serde(default)]
    pub node: Option<NodeConfig>,

    /// Fixed parameters for running without a node
    #[serde(default)]
    pub offline: Option<OfflineConfig>,
}

/// Fixed round parameters for offline runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfflineConfig {
    /// Challenge as a decimal or `0x` hex string
    pub challenge: String,
    /// Difficulty level (0..=256)
    pub difficulty: u64,
    /// Claimant address
    pub claimant: Address,
}

impl OfflineConfig {
    /// Parses the configured values into a parameter source
    pub fn parameters(&self) -> Result<StaticParameters, MinerError> {
        Ok(StaticParameters {
            challenge: parse_u256(&self.challenge)?,
            difficulty: self.difficulty,
            claimant: self.claimant,
        })
    }
}

/// Where a round takes its parameters from
#[derive(Debug, Clone, Copy)]
pub enum RoundSource<'a> {
    /// Live contract state read through a node
    Node(&'a NodeConfig),
    /// Fixed values from the `[offline]` section
    Offline(&'a OfflineConfig),
}

fn default_worker_count() -> usize {
    10
}

fn default_report_interval_secs() -> u64 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Config {
            worker_count: default_worker_count(),
            report_interval_secs: default_report_interval_secs(),
            node: None,
            offline: None,
        }
    }
}

impl Config {
    /// Loads configuration from a file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file (TOML format)
    ///
    /// # Returns
    /// * `Ok(Config)` - Successfully loaded configuration
    /// * `Err(MinerError)` - If file couldn't be read or parsed
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, MinerError> {
        let path = path.into();
        let config_str = std::fs::read_to_string(&path).map_err(|e| {
            MinerError::ConfigError(format!(
                "Failed to read config at {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::parse(&config_str)
    }

    /// Parses configuration from TOML text
    pub fn parse(text: &str) -> Result<Self, MinerError> {
        toml::from_str(text)
            .map_err(|e| MinerError::ConfigError(format!("Invalid config format: {}", e)))
    }

    /// Checks the values no round can start without
    pub fn validate(&self) -> Result<(), MinerError> {
        if self.worker_count == 0 {
            return Err(MinerError::ConfigError(
                "worker_count must be at least 1".to_string(),
            ));
        }
        if self.report_interval_secs == 0 {
            return Err(MinerError::ConfigError(
                "report_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.node.is_none() && self.offline.is_none() {
            return Err(MinerError::ConfigError(
                "Either a [node] or an [offline] section is required".to_string(),
            ));
        }
        if let Some(offline) = &self.offline {
            offline.parameters()?;
        }
        Ok(())
    }

    /// Picks the parameter source for a round
    ///
    /// A `[node]` section wins unless `offline` is requested; an `[offline]`
    /// section is used when it is the only one present or when `offline` is
    /// requested.
    ///
    /// # Arguments
    /// * `offline` - Whether the user asked for offline parameters
    ///
    /// # Returns
    /// * `Ok(RoundSource)` - The section the round should use
    /// * `Err(MinerError::ConfigError)` - If the requested section is missing
    pub fn round_source(&self, offline: bool) -> Result<RoundSource<'_>, MinerError> {
        match (&self.node, &self.offline) {
            (Some(node), None) if !offline => Ok(RoundSource::Node(node)),
            (Some(node), Some(_)) if !offline => Ok(RoundSource::Node(node)),
            (_, Some(params)) => Ok(RoundSource::Offline(params)),
            (Some(_), None) => Err(MinerError::ConfigError(
                "--offline requires an [offline] section".to_string(),
            )),
            (None, None) => Err(MinerError::ConfigError(
                "No parameter source configured".to_string(),
            )),
        }
    }

    /// Hashrate reporting interval
    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs)
    }

    /// Generates a configuration template string
    ///
    /// # Arguments
    /// * `node` - Include the node section
    /// * `offline` - Include the offline section
    pub fn generate_template(node: bool, offline: bool) -> String {
        let mut template = String::new();
        template.push_str("# PoWERC20 Miner Configuration\n\n");
        template.push_str("# Number of concurrent mining workers\n");
        template.push_str("worker_count = 10\n");
        template.push_str("# Seconds between hashrate reports\n");
        template.push_str("report_interval_secs = 1\n");

        if node {
            template.push_str("\n# Token contract reached through a JSON-RPC node\n");
            template.push_str("[node]\n");
            template.push_str("rpc_url = \"http://127.0.0.1:8545\"\n");
            template.push_str("contract_address = \"0xca9b78435be8267922e7ac5cde70401e7502c9cc\"\n");
            template.push_str("# Sign mine transactions locally with this key (hex, 32 bytes)\n");
            template.push_str("# private_key = \"0x...\"\n");
            template.push_str("# Without private_key the node must hold the key for this account\n");
            template.push_str("account = \"0x0000000000000000000000000000000000000000\"\n");
            template.push_str("confirmation_timeout_secs = 300\n");
            template.push_str("poll_interval_ms = 2000\n");
        }

        if offline {
            template.push_str("\n# Fixed parameters for searching without a node\n");
            template.push_str("[offline]\n");
            template.push_str("challenge = \"0x1\"\n");
            template.push_str("difficulty = 20\n");
            template.push_str("claimant = \"0x0000000000000000000000000000000000000000\"\n");
        }

        template
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_flags() {
        let config = Config::parse("[offline]\nchallenge = \"7\"\ndifficulty = 3\nclaimant = \"0x0000000000000000000000000000000000000001\"\n").unwrap();
        assert_eq!(config.worker_count, 10);
        assert_eq!(config.report_interval(), Duration::from_secs(1));
        assert!(config.validate().is_ok());
        assert_eq!(config.offline.unwrap().parameters().unwrap().difficulty, 3);
    }

    #[test]
    fn templates_parse_and_validate() {
        for (node, offline) in [(true, false), (false, true), (true, true)] {
            let config = Config::parse(&Config::generate_template(node, offline)).unwrap();
            assert_eq!(config.node.is_some(), node);
            assert_eq!(config.offline.is_some(), offline);
            config.validate().unwrap();
        }
    }

    #[test]
    fn template_without_sections_fails_validation() {
        let config = Config::parse(&Config::generate_template(false, false)).unwrap();
        assert!(matches!(config.validate(), Err(MinerError::ConfigError(_))));
    }

    #[test]
    fn zero_workers_rejected() {
        let mut config = Config::parse(&Config::generate_template(false, true)).unwrap();
        config.worker_count = 0;
        assert!(matches!(config.validate(), Err(MinerError::ConfigError(_))));
    }

    #[test]
    fn bad_challenge_rejected() {
        let mut config = Config::parse(&Config::generate_template(false, true)).unwrap();
        if let Some(offline) = config.offline.as_mut() {
            offline.challenge = "not-a-number".into();
        }
        assert!(config.validate().is_err());
    }

    #[test]
    fn round_source_prefers_node_unless_offline_requested() {
        let node_only = Config::parse(&Config::generate_template(true, false)).unwrap();
        let offline_only = Config::parse(&Config::generate_template(false, true)).unwrap();
        let both = Config::parse(&Config::generate_template(true, true)).unwrap();

        assert!(matches!(node_only.round_source(false), Ok(RoundSource::Node(_))));
        assert!(matches!(both.round_source(false), Ok(RoundSource::Node(_))));
        assert!(matches!(both.round_source(true), Ok(RoundSource::Offline(_))));
        assert!(matches!(offline_only.round_source(false), Ok(RoundSource::Offline(_))));
        assert!(matches!(offline_only.round_source(true), Ok(RoundSource::Offline(_))));
    }

    #[test]
    fn offline_flag_without_offline_section_is_rejected() {
        let node_only = Config::parse(&Config::generate_template(true, false)).unwrap();
        match node_only.round_source(true) {
            Err(MinerError::ConfigError(msg)) => assert!(msg.contains("[offline]")),
            other => panic!("unexpected source: {:?}", other),
        }

        let empty = Config::default();
        assert!(matches!(empty.round_source(false), Err(MinerError::ConfigError(_))));
    }

    #[test]
    fn node_section_accepts_a_private_key() {
        let text = Config::generate_template(true, false).replace(
            "# private_key = \"0x...\"",
            "private_key = \"0x4646464646464646464646464646464646464646464646464646464646464646\"",
        );
        let config = Config::parse(&text).unwrap();
        let node = config.node.unwrap();
        assert!(node.private_key.is_some());
        assert_eq!(node.rpc_url, "http://127.0.0.1:8545");
    }

    #[test]
    fn load_reports_missing_file() {
        let missing = std::env::temp_dir().join("powerc20-miner-missing-config.toml");
        assert!(matches!(Config::load(missing), Err(MinerError::ConfigError(_))));
    }

    #[test]
    fn load_reads_file() {
        let path = std::env::temp_dir().join(format!("powerc20-miner-{}.toml", std::process::id()));
        std::fs::write(&path, Config::generate_template(true, false)).unwrap();
        let config = Config::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(config.node.is_some());
    }
}
