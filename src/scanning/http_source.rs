//! HTTP block-explorer implementation of the UTXO source
//!
//! Two backends are supported, selected by the configured interface name:
//!
//! - `"blockchain.info"`: the public mainnet explorer at `https://blockchain.info`
//! - `"testnet"`: a self-hosted explorer with the same JSON API, at the
//!   configured base URL
//!
//! Both expose `GET {base}/unspent?active={address}` and
//! `GET {base}/rawtx/{txhash}`.
//!
//! ```rust,no_run
//! use colored_coin_libs::scanning::{HttpUtxoSourceBuilder, UtxoSource};
//!
//! async fn list_unspent() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = HttpUtxoSourceBuilder::new()
//!         .with_interface("blockchain.info")
//!         .build()?;
//!     let utxos = source.get_utxos("1BoatSLRHtKNngkdXEeobR76b53LETtpyT").await?;
//!     println!("{} unspent outputs", utxos.len());
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{
    config::UtxoFetcherConfig,
    data_structures::{
        transaction::{Transaction, TxInput, TxOutput},
        types::{OutPoint, TxHash},
    },
    errors::{ColorWalletError, ColorWalletResult},
    scanning::utxo_source::{SourceUtxo, TransactionProvider, UtxoSource},
};

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// blockchain.info answers an address without outputs with an error status
const NO_FREE_OUTPUTS: &str = "No free outputs to spend";

/// Explorer backends known by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtxoSourceKind {
    BlockchainInfo,
    Testnet,
}

impl UtxoSourceKind {
    pub fn from_interface(interface: &str) -> ColorWalletResult<Self> {
        match interface {
            "blockchain.info" => Ok(Self::BlockchainInfo),
            "testnet" => Ok(Self::Testnet),
            other => Err(ColorWalletError::Configuration(format!(
                "unknown UTXO source interface '{other}'"
            ))),
        }
    }

    pub fn interface(&self) -> &'static str {
        match self {
            Self::BlockchainInfo => "blockchain.info",
            Self::Testnet => "testnet",
        }
    }

    pub fn default_base_url(&self) -> Option<&'static str> {
        match self {
            Self::BlockchainInfo => Some("https://blockchain.info"),
            Self::Testnet => None,
        }
    }
}

/// `GET /unspent` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpUnspentResponse {
    pub unspent_outputs: Vec<HttpUnspentOutput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpUnspentOutput {
    pub tx_hash_big_endian: String,
    pub tx_output_n: u32,
    pub value: u64,
    pub script: String,
    #[serde(default)]
    pub confirmations: Option<u64>,
}

/// `GET /rawtx` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpRawTransaction {
    pub hash: String,
    pub inputs: Vec<HttpRawInput>,
    pub out: Vec<HttpRawOutput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpRawInput {
    /// Absent on coinbase inputs
    #[serde(default)]
    pub prev_out: Option<HttpPrevOut>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpPrevOut {
    #[serde(default)]
    pub tx_hash: Option<String>,
    pub n: u32,
    #[serde(default)]
    pub value: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpRawOutput {
    pub value: u64,
    pub script: String,
}

/// UTXO source backed by a block explorer's JSON API
pub struct HttpUtxoSource {
    client: Client,
    base_url: String,
    kind: UtxoSourceKind,
    timeout: Duration,
}

impl HttpUtxoSource {
    /// Source for `kind`, at `base_url` or the backend's default URL
    pub fn new(kind: UtxoSourceKind, base_url: Option<String>) -> ColorWalletResult<Self> {
        Self::with_timeout(kind, base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        kind: UtxoSourceKind,
        base_url: Option<String>,
        timeout: Duration,
    ) -> ColorWalletResult<Self> {
        let base_url = base_url
            .or_else(|| kind.default_base_url().map(str::to_string))
            .ok_or_else(|| {
                ColorWalletError::Configuration(format!(
                    "UTXO source '{}' needs a base_url",
                    kind.interface()
                ))
            })?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ColorWalletError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            kind,
            timeout,
        })
    }

    /// Source described by the `utxo_fetcher` configuration section
    pub fn from_config(config: &UtxoFetcherConfig) -> ColorWalletResult<Self> {
        let kind = UtxoSourceKind::from_interface(&config.interface)?;
        Self::with_timeout(
            kind,
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn kind(&self) -> UtxoSourceKind {
        self.kind
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_text(&self, url: &str) -> ColorWalletResult<(reqwest::StatusCode, String)> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ColorWalletError::Network(format!("GET {url} failed: {e}")))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ColorWalletError::Network(format!("Failed to read {url}: {e}")))?;
        Ok((status, body))
    }

    fn convert_unspent_output(output: HttpUnspentOutput) -> ColorWalletResult<SourceUtxo> {
        let mut utxo = SourceUtxo::new(
            TxHash::from_hex(&output.tx_hash_big_endian)?,
            output.tx_output_n,
            output.value,
            hex::decode(&output.script)?,
        );
        utxo.confirmations = output.confirmations;
        Ok(utxo)
    }

    fn convert_raw_transaction(raw: HttpRawTransaction) -> ColorWalletResult<Transaction> {
        let hash = TxHash::from_hex(&raw.hash)?;
        let inputs = raw
            .inputs
            .into_iter()
            .enumerate()
            .map(|(i, input)| -> ColorWalletResult<TxInput> {
                let Some(prev) = input.prev_out else {
                    return Ok(TxInput::coinbase());
                };
                let prev_hash = prev.tx_hash.ok_or_else(|| {
                    ColorWalletError::Parse(format!("input {i} of {hash} has no previous txhash"))
                })?;
                Ok(TxInput {
                    outpoint: OutPoint::new(TxHash::from_hex(&prev_hash)?, prev.n),
                    value: prev.value,
                })
            })
            .collect::<ColorWalletResult<Vec<_>>>()?;
        let outputs = raw
            .out
            .into_iter()
            .map(|o| -> ColorWalletResult<TxOutput> {
                Ok(TxOutput::new(o.value, hex::decode(&o.script)?))
            })
            .collect::<ColorWalletResult<Vec<_>>>()?;
        Ok(Transaction::new(hash, inputs, outputs))
    }
}

#[async_trait]
impl TransactionProvider for HttpUtxoSource {
    async fn get_transaction(&self, txhash: &TxHash) -> ColorWalletResult<Transaction> {
        let url = format!("{}/rawtx/{}", self.base_url, txhash);
        let (status, body) = self.get_text(&url).await?;
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ColorWalletError::ResourceNotFound(format!("transaction {txhash}")));
        }
        if !status.is_success() {
            return Err(ColorWalletError::Network(format!("GET {url} returned {status}: {body}")));
        }
        let raw: HttpRawTransaction = serde_json::from_str(&body)?;
        Self::convert_raw_transaction(raw)
    }
}

#[async_trait]
impl UtxoSource for HttpUtxoSource {
    async fn get_utxos(&self, address: &str) -> ColorWalletResult<Vec<SourceUtxo>> {
        let url = format!("{}/unspent?active={}", self.base_url, address);
        let (status, body) = self.get_text(&url).await?;
        if !status.is_success() {
            if body.contains(NO_FREE_OUTPUTS) {
                return Ok(Vec::new());
            }
            return Err(ColorWalletError::Network(format!("GET {url} returned {status}: {body}")));
        }

        let response: HttpUnspentResponse = serde_json::from_str(&body)?;
        tracing::debug!(
            "{} reported {} unspent outputs for {}",
            self.kind.interface(),
            response.unspent_outputs.len(),
            address
        );
        response
            .unspent_outputs
            .into_iter()
            .map(Self::convert_unspent_output)
            .collect()
    }

    fn name(&self) -> &str {
        self.kind.interface()
    }
}

impl std::fmt::Debug for HttpUtxoSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpUtxoSource")
            .field("kind", &self.kind)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Builder for [`HttpUtxoSource`]
#[derive(Debug, Default)]
pub struct HttpUtxoSourceBuilder {
    interface: Option<String>,
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl HttpUtxoSourceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend name, `"blockchain.info"` when not set
    pub fn with_interface(mut self, interface: &str) -> Self {
        self.interface = Some(interface.to_string());
        self
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> ColorWalletResult<HttpUtxoSource> {
        let kind = UtxoSourceKind::from_interface(
            self.interface.as_deref().unwrap_or("blockchain.info"),
        )?;
        HttpUtxoSource::with_timeout(kind, self.base_url, self.timeout.unwrap_or(DEFAULT_TIMEOUT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "b1586cd10b32f78795b86e9a3febe58dcb59189175fad884a7f4a6623b77486e";

    #[test]
    fn test_unknown_interface_is_configuration_error() {
        let err = HttpUtxoSourceBuilder::new()
            .with_interface("electrum")
            .build()
            .unwrap_err();
        assert!(matches!(err, ColorWalletError::Configuration(_)));
    }

    #[test]
    fn test_builder_defaults() {
        let source = HttpUtxoSourceBuilder::new()
            .with_timeout(Duration::from_secs(10))
            .build()
            .unwrap();
        assert_eq!(source.kind(), UtxoSourceKind::BlockchainInfo);
        assert_eq!(source.base_url(), "https://blockchain.info");
        assert_eq!(source.name(), "blockchain.info");
    }

    #[test]
    fn test_testnet_needs_base_url() {
        assert!(HttpUtxoSource::new(UtxoSourceKind::Testnet, None).is_err());
        let source = HttpUtxoSource::new(
            UtxoSourceKind::Testnet,
            Some("http://localhost:2750/".to_string()),
        )
        .unwrap();
        assert_eq!(source.base_url(), "http://localhost:2750");
    }

    #[test]
    fn test_from_config() {
        let config = UtxoFetcherConfig {
            interface: "testnet".to_string(),
            base_url: Some("http://explorer.local".to_string()),
            timeout_secs: 5,
        };
        let source = HttpUtxoSource::from_config(&config).unwrap();
        assert_eq!(source.kind(), UtxoSourceKind::Testnet);
    }

    #[test]
    fn test_unspent_response_parsing() {
        let json = format!(
            r#"{{
                "unspent_outputs": [
                    {{
                        "tx_hash": "6e48773b62a6f4a784d8fa75911859cb8de5eb3f9a6eb89587f7320bd16c58b1",
                        "tx_hash_big_endian": "{HASH}",
                        "tx_output_n": 1,
                        "script": "76a914641ad5051edd97029a003fe9efb29359fcee409d88ac",
                        "value": 5460,
                        "confirmations": 12
                    }}
                ]
            }}"#
        );
        let response: HttpUnspentResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(response.unspent_outputs.len(), 1);

        let utxo = HttpUtxoSource::convert_unspent_output(response.unspent_outputs[0].clone())
            .unwrap();
        assert_eq!(utxo.txhash.to_hex(), HASH);
        assert_eq!(utxo.outindex, 1);
        assert_eq!(utxo.value, 5460);
        assert_eq!(utxo.script.len(), 25);
        assert_eq!(utxo.confirmations, Some(12));
    }

    #[test]
    fn test_unspent_output_bad_hash() {
        let output = HttpUnspentOutput {
            tx_hash_big_endian: "1234".to_string(),
            tx_output_n: 0,
            value: 1,
            script: String::new(),
            confirmations: None,
        };
        assert!(matches!(
            HttpUtxoSource::convert_unspent_output(output),
            Err(ColorWalletError::Parse(_))
        ));
    }

    #[test]
    fn test_raw_transaction_parsing() {
        let json = format!(
            r#"{{
                "hash": "{HASH}",
                "inputs": [
                    {{ "prev_out": {{ "tx_hash": "{HASH}", "n": 2, "value": 1500 }} }},
                    {{ "prev_out": {{ "tx_hash": "{HASH}", "n": 0 }} }}
                ],
                "out": [
                    {{ "value": 1000, "script": "51" }},
                    {{ "value": 490, "script": "" }}
                ]
            }}"#
        );
        let raw: HttpRawTransaction = serde_json::from_str(&json).unwrap();
        let tx = HttpUtxoSource::convert_raw_transaction(raw).unwrap();
        assert_eq!(tx.hash.to_hex(), HASH);
        assert_eq!(tx.inputs[0].value, Some(1500));
        assert_eq!(tx.inputs[0].outpoint.outindex, 2);
        assert_eq!(tx.inputs[1].value, None);
        assert_eq!(tx.outputs[0].script, vec![0x51]);
        assert_eq!(tx.total_output_value(), 1490);
    }

    #[test]
    fn test_raw_coinbase_transaction() {
        let json = format!(
            r#"{{ "hash": "{HASH}", "inputs": [ {{}} ], "out": [ {{ "value": 5000000000, "script": "" }} ] }}"#
        );
        let raw: HttpRawTransaction = serde_json::from_str(&json).unwrap();
        let tx = HttpUtxoSource::convert_raw_transaction(raw).unwrap();
        assert!(tx.is_coinbase());
        assert_eq!(tx.input_values().unwrap(), vec![0]);
    }
}
