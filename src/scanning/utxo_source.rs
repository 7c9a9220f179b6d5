//! External chain data capabilities
//!
//! The wallet core never talks to the chain directly. It consumes two
//! capabilities: fetching a transaction by hash (needed to resolve input
//! values) and fetching the unspent outputs of an address (needed to keep the
//! UTXO store in sync).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    data_structures::{transaction::Transaction, types::TxHash},
    errors::ColorWalletResult,
};

/// Fetch-by-txhash capability
#[async_trait]
pub trait TransactionProvider: Send + Sync {
    async fn get_transaction(&self, txhash: &TxHash) -> ColorWalletResult<Transaction>;
}

/// An unspent output as reported by a UTXO source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceUtxo {
    pub txhash: TxHash,
    pub outindex: u32,
    pub value: u64,
    #[serde(with = "hex::serde")]
    pub script: Vec<u8>,
    /// Unix time the source saw the output, when it reports one
    #[serde(default)]
    pub scantime: Option<u64>,
    #[serde(default)]
    pub confirmations: Option<u64>,
}

impl SourceUtxo {
    pub fn new(txhash: TxHash, outindex: u32, value: u64, script: Vec<u8>) -> Self {
        Self {
            txhash,
            outindex,
            value,
            script,
            scantime: None,
            confirmations: None,
        }
    }
}

/// Fetch-by-address capability of an external chain source
#[async_trait]
pub trait UtxoSource: TransactionProvider {
    /// Current unspent outputs paying to `address`
    async fn get_utxos(&self, address: &str) -> ColorWalletResult<Vec<SourceUtxo>>;

    /// Short backend name, used in log messages
    fn name(&self) -> &str;
}
