// src/utils/error.rs
use serde_json;
use std::io;
use thiserror::Error;
use url;

/// Main error type for the mining application
///
/// Every failure a round can end with is one of these variants: configuration
/// problems caught before any worker starts, a broken randomness source inside
/// a worker, external cancellation, and the I/O failures of the node
/// collaborators.
#[derive(Error, Debug)]
pub enum MinerError {
    /// The operating system randomness source failed to produce a nonce
    #[error("Randomness error: {0}")]
    RandomnessError(String),

    /// Errors related to network connectivity
    #[error("Network connection error: {0}")]
    ConnectionError(String),

    /// Malformed or unexpected JSON-RPC responses
    #[error("Protocol violation: {0}")]
    ProtocolError(String),

    /// The found nonce could not be submitted or the transaction failed
    #[error("Submission error: {0}")]
    SubmissionError(String),

    /// The search was cancelled from outside before any worker finished
    #[error("Search cancelled")]
    Cancelled,

    /// Standard I/O operation errors
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    /// HTTP request/response errors
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The mine transaction could not be signed locally
    #[error("Signing error: {0}")]
    SigningError(String),

    /// Configuration file or parameter errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Thread communication channel errors
    #[error("Thread communication error: {0}")]
    ChannelError(String),

    /// Invalid user input or parameter errors
    #[error("Invalid input: {0}")]
    InputError(String),

    /// Async task execution errors
    #[error("Task execution error: {0}")]
    TaskError(String),
}

/// Converts hex decoding errors into MinerError
///
/// Raised while parsing addresses from the config file and while decoding
/// `eth_call` return data.
impl From<hex::FromHexError> for MinerError {
    fn from(e: hex::FromHexError) -> Self {
        MinerError::InputError(format!("Hex conversion failed: {}", e))
    }
}

/// Converts async task join errors into MinerError
///
/// The search runs on a blocking task; a panic there surfaces as `TaskError`.
impl From<tokio::task::JoinError> for MinerError {
    fn from(e: tokio::task::JoinError) -> Self {
        MinerError::TaskError(format!("Async task failed: {}", e))
    }
}

impl From<getrandom::Error> for MinerError {
    fn from(e: getrandom::Error) -> Self {
        MinerError::RandomnessError(format!("Failed to generate random nonce: {}", e))
    }
}

impl From<secp256k1::Error> for MinerError {
    fn from(e: secp256k1::Error) -> Self {
        MinerError::SigningError(e.to_string())
    }
}
