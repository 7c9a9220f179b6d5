//! Wallet configuration
//!
//! The configuration is a JSON document:
//!
//! ```json
//! {
//!   "testnet": false,
//!   "reference_fee": 750,
//!   "utxodb": {
//!     "dbpath": "utxo.db",
//!     "utxo_fetcher": { "interface": "blockchain.info", "timeout_secs": 30 }
//!   }
//! }
//! ```
//!
//! Every field is optional. With `testnet` set, the fetcher interface is
//! always `"testnet"` regardless of `utxo_fetcher.interface`.

use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::errors::{ColorWalletError, ColorWalletResult};

/// Fee paid by composed transactions unless configured otherwise
pub const DEFAULT_REFERENCE_FEE: u64 = 750;
pub const DEFAULT_DB_PATH: &str = "utxo.db";
pub const DEFAULT_INTERFACE: &str = "blockchain.info";
pub const TESTNET_INTERFACE: &str = "testnet";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Top-level wallet configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletConfig {
    #[serde(default)]
    pub testnet: bool,
    #[serde(default)]
    pub utxodb: UtxoDbConfig,
    #[serde(default = "default_reference_fee")]
    pub reference_fee: u64,
}

/// UTXO store and fetcher settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoDbConfig {
    #[serde(default = "default_db_path")]
    pub dbpath: String,
    #[serde(default)]
    pub utxo_fetcher: UtxoFetcherConfig,
}

/// External UTXO source settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoFetcherConfig {
    /// Backend name: `"blockchain.info"` or `"testnet"`
    #[serde(default = "default_interface")]
    pub interface: String,
    /// Explorer URL, required by the testnet backend
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_reference_fee() -> u64 {
    DEFAULT_REFERENCE_FEE
}

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

fn default_interface() -> String {
    DEFAULT_INTERFACE.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            testnet: false,
            utxodb: UtxoDbConfig::default(),
            reference_fee: DEFAULT_REFERENCE_FEE,
        }
    }
}

impl Default for UtxoDbConfig {
    fn default() -> Self {
        Self {
            dbpath: default_db_path(),
            utxo_fetcher: UtxoFetcherConfig::default(),
        }
    }
}

impl Default for UtxoFetcherConfig {
    fn default() -> Self {
        Self {
            interface: default_interface(),
            base_url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl UtxoFetcherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl WalletConfig {
    pub fn from_json_str(json: &str) -> ColorWalletResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ColorWalletError::Configuration(format!("Invalid wallet config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> ColorWalletResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ColorWalletError::Configuration(format!(
                "Failed to read wallet config {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json_str(&json)
    }

    /// Fetcher settings in effect, with the testnet override applied
    pub fn fetcher_config(&self) -> UtxoFetcherConfig {
        let mut fetcher = self.utxodb.utxo_fetcher.clone();
        if self.testnet {
            fetcher.interface = TESTNET_INTERFACE.to_string();
        }
        fetcher
    }

    pub fn validate(&self) -> ColorWalletResult<()> {
        if self.utxodb.dbpath.is_empty() {
            return Err(ColorWalletError::InvalidArgument {
                argument: "utxodb.dbpath".to_string(),
                value: String::new(),
                message: "database path must not be empty".to_string(),
            });
        }
        if self.utxodb.utxo_fetcher.timeout_secs == 0 {
            return Err(ColorWalletError::InvalidArgument {
                argument: "utxodb.utxo_fetcher.timeout_secs".to_string(),
                value: "0".to_string(),
                message: "timeout must be positive".to_string(),
            });
        }
        Ok(())
    }
}
