//! Color-graph evaluation
//!
//! [`ColorDataBuilder`] fills the color-value cache by running a color kernel
//! over the transactions of the color graph in topological order, so that the
//! colorstates of every input are already cached when a transaction is
//! evaluated.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    color_data::store::ColorDataStore,
    colordef::{ColorDefinition, ColorKernel, Genesis},
    data_structures::{
        color_state::ColorState,
        transaction::Transaction,
        types::{TxHash, UNCOLORED_COLOR_ID},
    },
    errors::{ColorWalletError, ColorWalletResult},
    scanning::utxo_source::TransactionProvider,
};

/// Supplier of the color graph: topologically sorted transactions
#[async_trait]
pub trait ColorGraphSource: TransactionProvider {
    /// Transactions from `genesis.txhash` up to and including `txhash`, each
    /// after every transaction it spends from
    async fn sorted_transactions(
        &self,
        genesis: &Genesis,
        txhash: &TxHash,
    ) -> ColorWalletResult<Vec<Transaction>>;
}

/// Runs color kernels over the color graph and records the results
pub struct ColorDataBuilder {
    store: Arc<dyn ColorDataStore>,
    graph: Arc<dyn ColorGraphSource>,
    // serializes graph walks so that no two evaluations race on the cache
    scan_lock: Mutex<()>,
}

impl ColorDataBuilder {
    pub fn new(store: Arc<dyn ColorDataStore>, graph: Arc<dyn ColorGraphSource>) -> Self {
        Self {
            store,
            graph,
            scan_lock: Mutex::new(()),
        }
    }

    /// Evaluate a single transaction whose inputs are already in the cache
    pub async fn scan_tx(&self, def: &ColorDefinition, tx: &Transaction) -> ColorWalletResult<()> {
        let color_id = def.color_id();

        let mut in_colorstates: Vec<Option<ColorState>> = Vec::with_capacity(tx.inputs.len());
        for input in &tx.inputs {
            let state = if input.is_coinbase() {
                None
            } else {
                self.store
                    .get(color_id, &input.outpoint.txhash, input.outpoint.outindex)
                    .await?
            };
            in_colorstates.push(state);
        }

        if in_colorstates.iter().all(Option::is_none) && !def.is_special_tx(tx) {
            self.store.mark_scanned(color_id, &tx.hash).await?;
            return Ok(());
        }

        let mut tx = tx.clone();
        tx.resolve_input_values(self.graph.as_ref()).await?;
        let out_colorstates = def.run_kernel(&tx, &in_colorstates)?;

        let mut colored = 0usize;
        for (outindex, state) in out_colorstates.iter().enumerate() {
            if let Some(state) = state {
                self.store
                    .put(color_id, &tx.hash, outindex as u32, state)
                    .await?;
                colored += 1;
            }
        }
        self.store.mark_scanned(color_id, &tx.hash).await?;

        tracing::debug!(
            "Scanned {} for color {}: {} of {} outputs colored",
            tx.hash,
            color_id,
            colored,
            tx.outputs.len()
        );
        Ok(())
    }

    /// Make sure `txhash` and everything it depends on were evaluated for the color
    pub async fn ensure_scanned(
        &self,
        def: &ColorDefinition,
        txhash: &TxHash,
    ) -> ColorWalletResult<()> {
        let color_id = def.color_id();
        if color_id == UNCOLORED_COLOR_ID {
            return Ok(());
        }

        let _guard = self.scan_lock.lock().await;
        if self.store.is_scanned(color_id, txhash).await? {
            return Ok(());
        }

        let genesis = def.genesis().ok_or_else(|| {
            ColorWalletError::Configuration(format!("color {color_id} has no genesis"))
        })?;
        let transactions = self.graph.sorted_transactions(genesis, txhash).await?;
        tracing::debug!(
            "Evaluating {} transactions for color {} up to {}",
            transactions.len(),
            color_id,
            txhash
        );

        for tx in &transactions {
            if !self.store.is_scanned(color_id, &tx.hash).await? {
                self.scan_tx(def, tx).await?;
            }
        }
        self.store.mark_scanned(color_id, txhash).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data_structures::{
            transaction::{TxInput, TxOutput},
            types::OutPoint,
        },
        scanning::mocks::MemoryColorGraph,
        storage::MemoryStorage,
    };

    fn hash(b: u8) -> TxHash {
        TxHash::new([b; 32])
    }

    fn def() -> ColorDefinition {
        ColorDefinition::from_descriptor(
            1,
            &crate::colordef::ColorDescriptor::order_based(Genesis::new(hash(0xAA), 0, 10)),
        )
        .unwrap()
    }

    /// genesis (0xAA) mints 1000 at output 0, and output 1 shares its segment;
    /// tx 0xBB splits output 0 into 600/400;
    /// tx 0xCC is unrelated
    fn graph() -> MemoryColorGraph {
        MemoryColorGraph::new(vec![
            Transaction::new(
                hash(0xAA),
                vec![TxInput::new(OutPoint::new(hash(0x01), 0))],
                vec![TxOutput::new(1000, vec![]), TxOutput::new(500, vec![])],
            ),
            Transaction::new(
                hash(0xCC),
                vec![TxInput::new(OutPoint::new(hash(0x02), 0))],
                vec![TxOutput::new(50, vec![])],
            ),
            Transaction::new(
                hash(0xBB),
                vec![TxInput::new(OutPoint::new(hash(0xAA), 0))],
                vec![TxOutput::new(600, vec![]), TxOutput::new(400, vec![])],
            ),
        ])
        .with_funding(hash(0x01), vec![TxOutput::new(1500, vec![])])
        .with_funding(hash(0x02), vec![TxOutput::new(50, vec![])])
    }

    #[tokio::test]
    async fn test_ensure_scanned_walks_from_genesis() {
        let store = Arc::new(MemoryStorage::new());
        let builder = ColorDataBuilder::new(store.clone(), Arc::new(graph()));
        let d = def();

        builder.ensure_scanned(&d, &hash(0xBB)).await.unwrap();

        assert_eq!(
            store.get(1, &hash(0xAA), 0).await.unwrap(),
            Some(ColorState::new(1000))
        );
        assert_eq!(
            store.get(1, &hash(0xAA), 1).await.unwrap(),
            Some(ColorState::new(500))
        );
        assert_eq!(
            store.get(1, &hash(0xBB), 1).await.unwrap(),
            Some(ColorState::new(400))
        );
        assert_eq!(store.get(1, &hash(0xCC), 0).await.unwrap(), None);
        assert!(store.is_scanned(1, &hash(0xCC)).await.unwrap());
        assert!(store.is_scanned(1, &hash(0xBB)).await.unwrap());
    }

    #[tokio::test]
    async fn test_ensure_scanned_is_idempotent() {
        let store = Arc::new(MemoryStorage::new());
        let builder = ColorDataBuilder::new(store.clone(), Arc::new(graph()));
        let d = def();

        builder.ensure_scanned(&d, &hash(0xBB)).await.unwrap();
        builder.ensure_scanned(&d, &hash(0xBB)).await.unwrap();
        builder.ensure_scanned(&d, &hash(0xAA)).await.unwrap();
        assert_eq!(store.get_any(&hash(0xBB), 0).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_scan_tx_skips_uncolored_non_genesis() {
        let store = Arc::new(MemoryStorage::new());
        let builder = ColorDataBuilder::new(store.clone(), Arc::new(graph()));
        let tx = Transaction::new(
            hash(0xDD),
            vec![TxInput::new(OutPoint::new(hash(0x09), 0))],
            vec![TxOutput::new(5, vec![])],
        );

        // inputs cannot be resolved, but no resolution is attempted
        builder.scan_tx(&def(), &tx).await.unwrap();
        assert!(store.is_scanned(1, &hash(0xDD)).await.unwrap());
        assert_eq!(store.get(1, &hash(0xDD), 0).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_uncolored_definition_is_noop() {
        let store = Arc::new(MemoryStorage::new());
        let builder = ColorDataBuilder::new(store.clone(), Arc::new(graph()));
        let uncolored = ColorDefinition::Uncolored(crate::colordef::UncoloredDefinition);
        builder.ensure_scanned(&uncolored, &hash(0xBB)).await.unwrap();
        assert!(!store.is_scanned(0, &hash(0xBB)).await.unwrap());
    }
}
