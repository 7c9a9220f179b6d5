//! Keeps the UTXO store in step with an external UTXO source
//!
//! A failure for one address is logged and reported in its
//! [`AddressSyncOutcome`]; it never stops the other addresses from syncing.

use std::sync::Arc;

use crate::{
    data_structures::utxo::Utxo,
    errors::{ColorWalletError, ColorWalletResult},
    scanning::utxo_source::UtxoSource,
    storage::UtxoStore,
    wallet::address_registry::AddressRegistry,
};

/// Result of synchronizing one address
#[derive(Debug)]
pub struct AddressSyncOutcome {
    pub address: String,
    /// Rows written to the store
    pub inserted: usize,
    /// Rows the store already held
    pub already_present: usize,
    /// Why the address could not be fully synchronized
    pub error: Option<ColorWalletError>,
}

impl AddressSyncOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of a full resynchronization
#[derive(Debug, Default)]
pub struct SyncReport {
    pub outcomes: Vec<AddressSyncOutcome>,
}

impl SyncReport {
    pub fn total_inserted(&self) -> usize {
        self.outcomes.iter().map(|o| o.inserted).sum()
    }

    pub fn failed(&self) -> impl Iterator<Item = &AddressSyncOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(AddressSyncOutcome::is_success)
    }
}

pub struct UtxoSynchronizer {
    source: Arc<dyn UtxoSource>,
    store: Arc<dyn UtxoStore>,
    registry: Arc<dyn AddressRegistry>,
}

impl UtxoSynchronizer {
    pub fn new(
        source: Arc<dyn UtxoSource>,
        store: Arc<dyn UtxoStore>,
        registry: Arc<dyn AddressRegistry>,
    ) -> Self {
        Self {
            source,
            store,
            registry,
        }
    }

    /// Fetch the unspent outputs of `address` and add them to the store
    pub async fn sync_address(&self, address: &str) -> AddressSyncOutcome {
        let mut outcome = AddressSyncOutcome {
            address: address.to_string(),
            inserted: 0,
            already_present: 0,
            error: None,
        };

        if let Err(e) = self.fetch_and_store(&mut outcome).await {
            tracing::warn!(
                "Failed to sync {} from {}: {}",
                address,
                self.source.name(),
                e
            );
            outcome.error = Some(e);
        } else {
            tracing::debug!(
                "Synced {}: {} new, {} already stored",
                address,
                outcome.inserted,
                outcome.already_present
            );
        }
        outcome
    }

    async fn fetch_and_store(&self, outcome: &mut AddressSyncOutcome) -> ColorWalletResult<()> {
        let fetched = self.source.get_utxos(&outcome.address).await?;
        for source_utxo in fetched {
            let utxo = Utxo::from_source(outcome.address.clone(), source_utxo);
            match self.store.add(&utxo).await {
                Ok(_) => outcome.inserted += 1,
                Err(ColorWalletError::ConstraintViolation(_)) => outcome.already_present += 1,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Clear the store and resynchronize every wallet address.
    ///
    /// Not safe to run while other tasks read the store.
    pub async fn sync_all(&self) -> ColorWalletResult<SyncReport> {
        let addresses = self.registry.all_addresses().await?;
        tracing::info!(
            "Full UTXO resync of {} addresses from {}",
            addresses.len(),
            self.source.name()
        );
        self.store.clear().await?;

        let mut report = SyncReport::default();
        for record in &addresses {
            report.outcomes.push(self.sync_address(&record.address).await);
        }

        tracing::info!(
            "UTXO resync finished: {} outputs stored, {} of {} addresses failed",
            report.total_inserted(),
            report.failed().count(),
            report.outcomes.len()
        );
        Ok(report)
    }
}
