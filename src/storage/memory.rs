//! In-memory storage backend
//!
//! Implements both the UTXO store and the color-value cache with the same
//! semantics as the SQLite backend. Used by tests and by callers that do not
//! need persistence. Failures can be injected with [`StorageFailureModes`].

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;

use crate::{
    color_data::ColorDataStore,
    data_structures::{
        color_state::{ColorState, ColorValue},
        types::{ColorId, TxHash},
        utxo::Utxo,
    },
    errors::{ColorWalletError, ColorWalletResult},
    storage::UtxoStore,
};

#[derive(Debug, Clone, Default)]
pub struct StorageFailureModes {
    /// Fail next add call
    pub fail_add: bool,
    /// Fail next clear call
    pub fail_clear: bool,
    /// Fail next read
    pub fail_reads: bool,
}

#[derive(Debug, Default)]
struct UtxoTable {
    rows: BTreeMap<i64, Utxo>,
    next_id: i64,
}

/// Volatile storage for UTXOs and cached colorvalues
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    utxos: Arc<Mutex<UtxoTable>>,
    color_data: Arc<Mutex<BTreeMap<(ColorId, TxHash, u32), ColorState>>>,
    color_scans: Arc<Mutex<BTreeSet<(ColorId, TxHash)>>>,
    failure_modes: Arc<Mutex<StorageFailureModes>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failure_modes(&self, modes: StorageFailureModes) {
        *lock(&self.failure_modes) = modes;
    }

    fn check_failure(&self, operation: &str) -> ColorWalletResult<()> {
        let mut modes = lock(&self.failure_modes);
        let flag = match operation {
            "add" => &mut modes.fail_add,
            "clear" => &mut modes.fail_clear,
            _ => &mut modes.fail_reads,
        };
        if std::mem::take(flag) {
            return Err(ColorWalletError::Storage(format!("Mock failure: {operation}")));
        }
        Ok(())
    }

    fn select<F>(&self, predicate: F) -> ColorWalletResult<Vec<Utxo>>
    where
        F: Fn(&Utxo) -> bool,
    {
        self.check_failure("read")?;
        Ok(lock(&self.utxos)
            .rows
            .values()
            .filter(|utxo| predicate(utxo))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UtxoStore for MemoryStorage {
    async fn add(&self, utxo: &Utxo) -> ColorWalletResult<i64> {
        self.check_failure("add")?;
        let mut table = lock(&self.utxos);
        if table
            .rows
            .values()
            .any(|row| row.txhash == utxo.txhash && row.outindex == utxo.outindex)
        {
            return Err(ColorWalletError::ConstraintViolation(format!(
                "UTXO {} is already stored",
                utxo.outpoint()
            )));
        }
        table.next_id += 1;
        let id = table.next_id;
        let mut row = utxo.clone();
        row.id = Some(id);
        row.address_rec = None;
        row.colorvalues = None;
        table.rows.insert(id, row);
        Ok(id)
    }

    async fn remove(&self, txhash: &TxHash, outindex: u32) -> ColorWalletResult<bool> {
        let mut table = lock(&self.utxos);
        let before = table.rows.len();
        table
            .rows
            .retain(|_, row| !(row.txhash == *txhash && row.outindex == outindex));
        Ok(table.rows.len() < before)
    }

    async fn clear(&self) -> ColorWalletResult<()> {
        self.check_failure("clear")?;
        lock(&self.utxos).rows.clear();
        Ok(())
    }

    async fn for_address(&self, address: &str) -> ColorWalletResult<Vec<Utxo>> {
        self.select(|utxo| utxo.address == address)
    }

    async fn for_tx(&self, txhash: &TxHash) -> ColorWalletResult<Vec<Utxo>> {
        self.select(|utxo| utxo.txhash == *txhash)
    }

    async fn all(&self) -> ColorWalletResult<Vec<Utxo>> {
        self.select(|_| true)
    }
}

#[async_trait]
impl ColorDataStore for MemoryStorage {
    async fn get(
        &self,
        color_id: ColorId,
        txhash: &TxHash,
        outindex: u32,
    ) -> ColorWalletResult<Option<ColorState>> {
        self.check_failure("read")?;
        Ok(lock(&self.color_data)
            .get(&(color_id, *txhash, outindex))
            .cloned())
    }

    async fn put(
        &self,
        color_id: ColorId,
        txhash: &TxHash,
        outindex: u32,
        state: &ColorState,
    ) -> ColorWalletResult<()> {
        let mut data = lock(&self.color_data);
        match data.get(&(color_id, *txhash, outindex)) {
            Some(existing) if existing == state => Ok(()),
            Some(existing) => Err(ColorWalletError::ConstraintViolation(format!(
                "color {color_id} of {txhash}:{outindex} is already {}, refusing {}",
                existing.value, state.value
            ))),
            None => {
                data.insert((color_id, *txhash, outindex), state.clone());
                Ok(())
            }
        }
    }

    async fn get_any(&self, txhash: &TxHash, outindex: u32) -> ColorWalletResult<Vec<ColorValue>> {
        self.check_failure("read")?;
        Ok(lock(&self.color_data)
            .iter()
            .filter(|((_, hash, index), _)| hash == txhash && *index == outindex)
            .map(|((color_id, _, _), state)| ColorValue::new(*color_id, state.value))
            .collect())
    }

    async fn mark_scanned(&self, color_id: ColorId, txhash: &TxHash) -> ColorWalletResult<()> {
        lock(&self.color_scans).insert((color_id, *txhash));
        Ok(())
    }

    async fn is_scanned(&self, color_id: ColorId, txhash: &TxHash) -> ColorWalletResult<bool> {
        Ok(lock(&self.color_scans).contains(&(color_id, *txhash)))
    }
}
