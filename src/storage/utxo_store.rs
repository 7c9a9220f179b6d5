//! UTXO store abstraction
//!
//! Rows are unique on `(txhash, outindex)`. Rows are created by the
//! synchronizer and removed when spent or when the store is cleared for a
//! full resync; they are never updated in place.

use async_trait::async_trait;

use crate::{
    data_structures::{types::TxHash, utxo::Utxo},
    errors::ColorWalletResult,
};

#[async_trait]
pub trait UtxoStore: Send + Sync {
    /// Insert a row and return its id. A second row for the same outpoint is
    /// rejected with `ConstraintViolation`.
    async fn add(&self, utxo: &Utxo) -> ColorWalletResult<i64>;

    /// Remove the row for an outpoint, returning whether one existed
    async fn remove(&self, txhash: &TxHash, outindex: u32) -> ColorWalletResult<bool>;

    /// Remove every row
    async fn clear(&self) -> ColorWalletResult<()>;

    async fn for_address(&self, address: &str) -> ColorWalletResult<Vec<Utxo>>;

    async fn for_tx(&self, txhash: &TxHash) -> ColorWalletResult<Vec<Utxo>>;

    async fn all(&self) -> ColorWalletResult<Vec<Utxo>>;

    async fn count(&self) -> ColorWalletResult<usize> {
        Ok(self.all().await?.len())
    }
}
