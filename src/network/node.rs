// src/network/node.rs
use crate::network::abi;
use crate::network::signer::{LegacyTransaction, LocalSigner, PrivateKey};
use crate::network::{Confirmation, ParameterSource, Submitter};
use crate::types::Address;
use crate::utils::error::MinerError;
use primitive_types::U256;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use url::Url;

/// Configuration for talking to the token contract through a node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// JSON-RPC endpoint of an Ethereum node
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    /// Address of the PoW token contract
    #[serde(default = "default_contract_address")]
    pub contract_address: Address,
    /// Key the miner signs `mine` transactions with
    #[serde(default)]
    pub private_key: Option<PrivateKey>,
    /// Claimant account; without `private_key` the node must sign for it
    #[serde(default)]
    pub account: Option<Address>,
    /// How long to wait for the mine transaction to be included
    #[serde(default = "default_confirmation_timeout_secs")]
    pub confirmation_timeout_secs: u64,
    /// Delay between receipt polls
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_rpc_url() -> String {
    "http://127.0.0.1:8545".into()
}

fn default_contract_address() -> Address {
    Address([
        0xca, 0x9b, 0x78, 0x43, 0x5b, 0xe8, 0x26, 0x79, 0x22, 0xe7, 0xac, 0x5c, 0xde, 0x70, 0x40,
        0x1e, 0x75, 0x02, 0xc9, 0xcc,
    ])
}

fn default_confirmation_timeout_secs() -> u64 {
    300
}

fn default_poll_interval_ms() -> u64 {
    2000
}

/// JSON-RPC client for the token contract
///
/// Reads the round parameters with `eth_call`. With a private key configured
/// it signs `mine(nonce)` locally and relays it with `eth_sendRawTransaction`;
/// otherwise it falls back to `eth_sendTransaction` and the node signs.
pub struct NodeClient {
    /// Connection and contract settings
    config: NodeConfig,
    /// HTTP client for making RPC requests
    client: Client,
    /// Monotonic JSON-RPC request id
    next_id: AtomicU64,
    /// Local key, if configured
    signer: Option<LocalSigner>,
    /// Account the proofs are bound to
    claimant: Address,
}

impl NodeClient {
    /// Creates a new node client
    ///
    /// # Arguments
    /// * `config` - Endpoint, contract and account settings
    ///
    /// # Returns
    /// * `Ok(NodeClient)` - Client bound to the claimant account
    /// * `Err(MinerError)` - If the URL or key is invalid, if neither a key
    ///   nor an account is configured, or if the account does not belong to
    ///   the key
    pub fn new(config: NodeConfig) -> Result<Self, MinerError> {
        Url::parse(&config.rpc_url)?;

        let signer = config
            .private_key
            .as_ref()
            .map(|key| LocalSigner::from_hex(&key.0))
            .transpose()?;
        let claimant = claimant_for(signer.as_ref(), config.account)?;

        Ok(NodeClient {
            config,
            client: Client::new(),
            next_id: AtomicU64::new(1),
            signer,
            claimant,
        })
    }

    /// Chain id reported by the node
    pub async fn chain_id(&self) -> Result<u64, MinerError> {
        let result = self.rpc_call("eth_chainId", json!([])).await?;
        abi::parse_quantity(as_str(&result, "eth_chainId")?)
    }

    /// Name of the token contract
    pub async fn token_name(&self) -> Result<String, MinerError> {
        abi::decode_string(&self.call("name()").await?)
    }

    /// Executes a read-only contract call without arguments
    async fn call(&self, signature: &str) -> Result<Vec<u8>, MinerError> {
        let data = abi::encode_call(signature, &[]);
        let result = self
            .rpc_call(
                "eth_call",
                json!([
                    {
                        "to": self.config.contract_address.to_string(),
                        "data": abi::to_hex(&data),
                    },
                    "latest"
                ]),
            )
            .await?;
        abi::from_hex(as_str(&result, signature)?)
    }

    /// Reads a hex quantity result
    async fn quantity(&self, method: &str, params: Value) -> Result<u64, MinerError> {
        let result = self.rpc_call(method, params).await?;
        abi::parse_quantity(as_str(&result, method)?)
    }

    /// Signs `data` for the contract locally and relays the raw transaction
    async fn send_signed(&self, signer: &LocalSigner, data: Vec<u8>) -> Result<String, MinerError> {
        let from = signer.address().to_string();
        let to = self.config.contract_address.to_string();

        let nonce = self
            .quantity("eth_getTransactionCount", json!([from, "pending"]))
            .await?;
        let gas_price = self.quantity("eth_gasPrice", json!([])).await?;
        let gas_limit = self
            .quantity(
                "eth_estimateGas",
                json!([{ "from": from, "to": to, "data": abi::to_hex(&data) }]),
            )
            .await?;
        let chain_id = self.chain_id().await?;

        let tx = LegacyTransaction {
            nonce,
            gas_price: U256::from(gas_price),
            gas_limit,
            to: self.config.contract_address,
            value: U256::zero(),
            data,
            chain_id,
        };
        log::debug!(
            "Signing mine transaction: nonce {}, gas {} at {} wei, chain {}",
            tx.nonce,
            tx.gas_limit,
            tx.gas_price,
            tx.chain_id
        );
        let raw = signer.sign_raw(&tx)?;

        let result = self
            .rpc_call("eth_sendRawTransaction", json!([abi::to_hex(&raw)]))
            .await?;
        Ok(as_str(&result, "eth_sendRawTransaction")?.to_string())
    }

    /// Asks the node to sign and send for the claimant account
    async fn send_unsigned(&self, data: Vec<u8>) -> Result<String, MinerError> {
        let result = self
            .rpc_call(
                "eth_sendTransaction",
                json!([{
                    "from": self.claimant.to_string(),
                    "to": self.config.contract_address.to_string(),
                    "data": abi::to_hex(&data),
                }]),
            )
            .await?;
        Ok(as_str(&result, "eth_sendTransaction")?.to_string())
    }

    /// Makes an RPC call and returns its `result` member
    async fn rpc_call(&self, method: &str, params: Value) -> Result<Value, MinerError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let response: Value = self
            .client
            .post(&self.config.rpc_url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": id,
                "method": method,
                "params": params
            }))
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    MinerError::ConnectionError(format!("{}: {}", self.config.rpc_url, e))
                } else {
                    MinerError::HttpError(e)
                }
            })?
            .error_for_status()?
            .json()
            .await?;

        extract_result(method, response)
    }

    /// Waits for the transaction receipt until it is mined or the timeout hits
    async fn wait_for_receipt(&self, tx_hash: &str) -> Result<Confirmation, MinerError> {
        let timeout = Duration::from_secs(self.config.confirmation_timeout_secs);

        tokio::time::timeout(timeout, self.poll_receipt(tx_hash))
            .await
            .map_err(|_| {
                MinerError::SubmissionError(format!(
                    "Transaction {} not confirmed within {}s",
                    tx_hash, self.config.confirmation_timeout_secs
                ))
            })?
    }

    async fn poll_receipt(&self, tx_hash: &str) -> Result<Confirmation, MinerError> {
        let mut interval = tokio::time::interval(Duration::from_millis(self.config.poll_interval_ms));
        loop {
            interval.tick().await;
            let receipt = self
                .rpc_call("eth_getTransactionReceipt", json!([tx_hash]))
                .await?;
            if let Some(confirmation) = parse_receipt(tx_hash, &receipt)? {
                return Ok(confirmation);
            }
            log::debug!("Transaction {} not yet mined", tx_hash);
        }
    }
}

impl ParameterSource for NodeClient {
    async fn challenge(&self) -> Result<U256, MinerError> {
        abi::decode_u256(&self.call("challenge()").await?)
    }

    async fn difficulty(&self) -> Result<u64, MinerError> {
        let difficulty = abi::decode_u256(&self.call("difficulty()").await?)?;
        // Anything this large is rejected by the target calculator anyway
        if difficulty > U256::from(u64::MAX) {
            return Ok(u64::MAX);
        }
        Ok(difficulty.low_u64())
    }

    fn claimant(&self) -> Address {
        self.claimant
    }
}

impl Submitter for NodeClient {
    async fn submit(&self, nonce: U256) -> Result<Confirmation, MinerError> {
        let data = abi::encode_call("mine(uint256)", &[nonce]);
        let sent = match &self.signer {
            Some(signer) => self.send_signed(signer, data).await,
            None => self.send_unsigned(data).await,
        };
        let tx_hash = sent
            .map_err(|e| MinerError::SubmissionError(format!("Failed to submit mine transaction: {}", e)))?;
        log::info!("Mine transaction sent: {}", tx_hash);

        self.wait_for_receipt(&tx_hash).await
    }
}

/// Resolves the claimant from the key and the configured account
fn claimant_for(signer: Option<&LocalSigner>, account: Option<Address>) -> Result<Address, MinerError> {
    match (signer, account) {
        (Some(signer), Some(account)) if signer.address() != account => {
            Err(MinerError::ConfigError(format!(
                "account {} does not match the private key's address {}",
                account,
                signer.address()
            )))
        }
        (Some(signer), _) => Ok(signer.address()),
        (None, Some(account)) => Ok(account),
        (None, None) => Err(MinerError::ConfigError(
            "[node] needs a private_key or an account".to_string(),
        )),
    }
}

fn as_str<'a>(value: &'a Value, what: &str) -> Result<&'a str, MinerError> {
    value
        .as_str()
        .ok_or_else(|| MinerError::ProtocolError(format!("{} returned non-string result: {}", what, value)))
}

/// Splits a JSON-RPC response into its result or error
fn extract_result(method: &str, mut response: Value) -> Result<Value, MinerError> {
    if let Some(error) = response.get("error") {
        return Err(MinerError::ProtocolError(format!("{} failed: {}", method, error)));
    }
    match response.get_mut("result") {
        Some(result) => Ok(result.take()),
        None => Err(MinerError::ProtocolError(format!(
            "{} response has no result",
            method
        ))),
    }
}

/// Interprets an `eth_getTransactionReceipt` result
///
/// `None` while the transaction is pending.
fn parse_receipt(tx_hash: &str, receipt: &Value) -> Result<Option<Confirmation>, MinerError> {
    if receipt.is_null() {
        return Ok(None);
    }

    let block_number = match receipt["blockNumber"].as_str() {
        Some(block) => abi::parse_quantity(block)?,
        None => return Ok(None),
    };

    match receipt["status"].as_str() {
        Some("0x1") => Ok(Some(Confirmation {
            handle: tx_hash.to_string(),
            block_number: Some(block_number),
        })),
        Some(status) => Err(MinerError::SubmissionError(format!(
            "Transaction {} reverted (status {})",
            tx_hash, status
        ))),
        None => Err(MinerError::ProtocolError(format!(
            "Receipt for {} has no status",
            tx_hash
        ))),
    }
}
