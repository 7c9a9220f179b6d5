//! In-memory chain collaborators for deterministic testing
//!
//! [`MockUtxoSource`] stands in for a block explorer and can be told to fail,
//! [`MemoryColorGraph`] serves a fixed, already sorted transaction graph to
//! the color-data builder.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;

use crate::{
    color_data::ColorGraphSource,
    colordef::Genesis,
    data_structures::{
        transaction::{Transaction, TxOutput},
        types::TxHash,
    },
    errors::{ColorWalletError, ColorWalletResult},
    scanning::utxo_source::{SourceUtxo, TransactionProvider, UtxoSource},
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Default)]
pub struct MockNetworkFailureModes {
    /// Fail next get_utxos call
    pub fail_get_utxos: bool,
    /// Fail next get_transaction call
    pub fail_get_transaction: bool,
    /// Addresses whose get_utxos always fails
    pub failing_addresses: HashSet<String>,
    /// Return specific error message for next operation
    pub next_error_message: Option<String>,
}

/// Mock UTXO source for deterministic testing
#[derive(Debug, Clone, Default)]
pub struct MockUtxoSource {
    utxos: Arc<Mutex<HashMap<String, Vec<SourceUtxo>>>>,
    transactions: Arc<Mutex<HashMap<TxHash, Transaction>>>,
    failure_modes: Arc<Mutex<MockNetworkFailureModes>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockUtxoSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the unspent outputs reported for `address`
    pub fn set_utxos(&self, address: &str, utxos: Vec<SourceUtxo>) {
        lock(&self.utxos).insert(address.to_string(), utxos);
    }

    pub fn add_utxo(&self, address: &str, utxo: SourceUtxo) {
        lock(&self.utxos)
            .entry(address.to_string())
            .or_default()
            .push(utxo);
    }

    pub fn add_transaction(&self, tx: Transaction) {
        lock(&self.transactions).insert(tx.hash, tx);
    }

    pub fn set_failure_modes(&self, modes: MockNetworkFailureModes) {
        *lock(&self.failure_modes) = modes;
    }

    /// Addresses queried so far, in order
    pub fn requested_addresses(&self) -> Vec<String> {
        lock(&self.requests).clone()
    }

    pub fn reset(&self) {
        lock(&self.utxos).clear();
        lock(&self.transactions).clear();
        lock(&self.requests).clear();
        *lock(&self.failure_modes) = MockNetworkFailureModes::default();
    }

    fn check_failure(&self, operation: &str, address: Option<&str>) -> ColorWalletResult<()> {
        let mut modes = lock(&self.failure_modes);

        if let Some(error_msg) = modes.next_error_message.take() {
            return Err(ColorWalletError::Network(error_msg));
        }
        if address.is_some_and(|a| modes.failing_addresses.contains(a)) {
            return Err(ColorWalletError::Network(format!(
                "Mock failure: {operation} for {}",
                address.unwrap_or_default()
            )));
        }

        match operation {
            "get_utxos" if modes.fail_get_utxos => {
                modes.fail_get_utxos = false; // Reset after use
                Err(ColorWalletError::Network("Mock failure: get_utxos".to_string()))
            }
            "get_transaction" if modes.fail_get_transaction => {
                modes.fail_get_transaction = false; // Reset after use
                Err(ColorWalletError::Network(
                    "Mock failure: get_transaction".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl TransactionProvider for MockUtxoSource {
    async fn get_transaction(&self, txhash: &TxHash) -> ColorWalletResult<Transaction> {
        self.check_failure("get_transaction", None)?;
        lock(&self.transactions)
            .get(txhash)
            .cloned()
            .ok_or_else(|| ColorWalletError::ResourceNotFound(format!("transaction {txhash}")))
    }
}

#[async_trait]
impl UtxoSource for MockUtxoSource {
    async fn get_utxos(&self, address: &str) -> ColorWalletResult<Vec<SourceUtxo>> {
        lock(&self.requests).push(address.to_string());
        self.check_failure("get_utxos", Some(address))?;
        Ok(lock(&self.utxos).get(address).cloned().unwrap_or_default())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Fixed color graph, listed in topological order
#[derive(Debug, Clone, Default)]
pub struct MemoryColorGraph {
    sorted: Vec<Transaction>,
    // transactions outside the graph that only fund its inputs
    funding: HashMap<TxHash, Transaction>,
}

impl MemoryColorGraph {
    pub fn new(sorted: Vec<Transaction>) -> Self {
        Self {
            sorted,
            funding: HashMap::new(),
        }
    }

    /// Register a funding transaction with the given outputs and no inputs
    pub fn with_funding(mut self, txhash: TxHash, outputs: Vec<TxOutput>) -> Self {
        self.funding
            .insert(txhash, Transaction::new(txhash, Vec::new(), outputs));
        self
    }

    /// Append a transaction after every transaction already in the graph
    pub fn push(&mut self, tx: Transaction) {
        self.sorted.push(tx);
    }

    fn position(&self, txhash: &TxHash) -> ColorWalletResult<usize> {
        self.sorted
            .iter()
            .position(|tx| tx.hash == *txhash)
            .ok_or_else(|| {
                ColorWalletError::ResourceNotFound(format!("transaction {txhash} is not in the graph"))
            })
    }
}

#[async_trait]
impl TransactionProvider for MemoryColorGraph {
    async fn get_transaction(&self, txhash: &TxHash) -> ColorWalletResult<Transaction> {
        self.sorted
            .iter()
            .find(|tx| tx.hash == *txhash)
            .or_else(|| self.funding.get(txhash))
            .cloned()
            .ok_or_else(|| ColorWalletError::ResourceNotFound(format!("transaction {txhash}")))
    }
}

#[async_trait]
impl ColorGraphSource for MemoryColorGraph {
    async fn sorted_transactions(
        &self,
        genesis: &Genesis,
        txhash: &TxHash,
    ) -> ColorWalletResult<Vec<Transaction>> {
        let start = self.position(&genesis.txhash)?;
        let end = self.position(txhash)?;
        if end < start {
            return Ok(Vec::new());
        }
        Ok(self.sorted[start..=end].to_vec())
    }
}
