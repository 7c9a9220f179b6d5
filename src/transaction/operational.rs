//! Store-backed operational spec
//!
//! Draws coins from the UTXO store through [`UtxoQuery`] and change
//! addresses from the address registry.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    color_data::ColorData,
    config::DEFAULT_REFERENCE_FEE,
    data_structures::{
        color_set::ColorSet,
        types::{ColorId, UNCOLORED_COLOR_ID},
        utxo::Utxo,
    },
    errors::{ColorWalletError, ColorWalletResult},
    query::UtxoQuery,
    storage::UtxoStore,
    transaction::tx_spec::{ColorTarget, OperationalTxSpec},
    wallet::address_registry::AddressRegistry,
};

/// Operational spec for spending one asset (a color set) plus uncolored coins
pub struct SimpleOperationalTxSpec {
    asset: ColorSet,
    store: Arc<dyn UtxoStore>,
    color_data: Arc<ColorData>,
    registry: Arc<dyn AddressRegistry>,
    reference_fee: u64,
    targets: Vec<ColorTarget>,
}

impl SimpleOperationalTxSpec {
    pub fn new(
        asset: ColorSet,
        store: Arc<dyn UtxoStore>,
        color_data: Arc<ColorData>,
        registry: Arc<dyn AddressRegistry>,
    ) -> Self {
        Self {
            asset,
            store,
            color_data,
            registry,
            reference_fee: DEFAULT_REFERENCE_FEE,
            targets: Vec::new(),
        }
    }

    pub fn with_reference_fee(mut self, reference_fee: u64) -> Self {
        self.reference_fee = reference_fee;
        self
    }

    pub fn add_target(&mut self, address: impl Into<String>, color_id: ColorId, value: u64) {
        self.targets.push(ColorTarget::new(address, color_id, value));
    }

    pub fn asset(&self) -> &ColorSet {
        &self.asset
    }

    fn is_supported(&self, color_id: ColorId) -> bool {
        color_id == UNCOLORED_COLOR_ID || self.asset.has_color_id(color_id)
    }
}

#[async_trait]
impl OperationalTxSpec for SimpleOperationalTxSpec {
    fn targets(&self) -> Vec<ColorTarget> {
        self.targets.clone()
    }

    async fn select_coins(
        &self,
        color_id: ColorId,
        value: u64,
    ) -> ColorWalletResult<(Vec<Utxo>, u64)> {
        if !self.is_supported(color_id) {
            return Err(ColorWalletError::Configuration(format!(
                "color {color_id} is not part of the asset"
            )));
        }
        if value == 0 {
            return Err(ColorWalletError::ZeroSelect { color_id });
        }

        let color_set = ColorSet::from_color_ids(self.color_data.color_map(), [color_id])?;
        let query = UtxoQuery::new(
            color_set,
            self.store.clone(),
            self.color_data.clone(),
            self.registry.clone(),
        );

        let mut selected = Vec::new();
        let mut total = 0u64;
        for utxo in query.result().await? {
            total = total.saturating_add(utxo.value);
            selected.push(utxo);
            if total >= value {
                return Ok((selected, total));
            }
        }

        Err(ColorWalletError::InsufficientFunds(format!(
            "Not enough coins of color {color_id}. Available: {total}, required: {value}"
        )))
    }

    fn required_fee(&self) -> u64 {
        self.reference_fee
    }

    async fn change_address(&self, color_id: ColorId) -> ColorWalletResult<String> {
        let color_set = if color_id == UNCOLORED_COLOR_ID {
            ColorSet::uncolored()
        } else if self.asset.has_color_id(color_id) {
            self.asset.clone()
        } else {
            return Err(ColorWalletError::Configuration(format!(
                "no change address for color {color_id} outside the asset"
            )));
        };
        Ok(self.registry.change_address(&color_set).await?.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        color_data::ColorDataStore,
        colordef::ColorMap,
        data_structures::{color_state::ColorState, types::TxHash},
        scanning::mocks::MemoryColorGraph,
        storage::MemoryStorage,
        wallet::address_registry::{AddressRecord, MemoryAddressRegistry},
    };

    const BLUE: &str = "obc:b1586cd10b32f78795b86e9a3febe58dcb59189175fad884a7f4a6623b77486e:0:46442";

    async fn fixture() -> (SimpleOperationalTxSpec, Arc<MemoryStorage>) {
        let map = Arc::new(ColorMap::builder().with_descriptor(BLUE).unwrap().build());
        let storage = Arc::new(MemoryStorage::new());
        let color_data = Arc::new(ColorData::new(
            storage.clone(),
            Arc::new(MemoryColorGraph::default()),
            map.clone(),
        ));
        let blue = ColorSet::from_descriptors(&map, [BLUE]).unwrap();
        let registry = Arc::new(MemoryAddressRegistry::new(vec![
            AddressRecord::new("plain", ColorSet::uncolored()),
            AddressRecord::new("blue", blue.clone()),
        ]));

        let colored = TxHash::new([7; 32]);
        for (i, value) in [400u64, 300].into_iter().enumerate() {
            storage
                .add(&Utxo::new("blue", colored, i as u32, value, vec![]))
                .await
                .unwrap();
            storage
                .put(1, &colored, i as u32, &ColorState::new(value))
                .await
                .unwrap();
        }
        storage.mark_scanned(1, &colored).await.unwrap();
        storage
            .add(&Utxo::new("plain", TxHash::new([8; 32]), 0, 2_000, vec![]))
            .await
            .unwrap();

        let spec = SimpleOperationalTxSpec::new(blue, storage.clone(), color_data, registry);
        (spec, storage)
    }

    #[tokio::test]
    async fn test_select_coins_accumulates_until_enough() {
        let (spec, _) = fixture().await;

        let (coins, total) = spec.select_coins(1, 500).await.unwrap();
        assert_eq!(coins.len(), 2);
        assert_eq!(total, 700);

        let (coins, total) = spec.select_coins(0, 1_000).await.unwrap();
        assert_eq!(coins.len(), 1);
        assert_eq!(total, 2_000);
    }

    #[tokio::test]
    async fn test_select_coins_rejections() {
        let (spec, _) = fixture().await;
        assert!(matches!(
            spec.select_coins(5, 10).await,
            Err(ColorWalletError::Configuration(_))
        ));
        assert!(matches!(
            spec.select_coins(1, 0).await,
            Err(ColorWalletError::ZeroSelect { color_id: 1 })
        ));
        assert!(matches!(
            spec.select_coins(1, 701).await,
            Err(ColorWalletError::InsufficientFunds(_))
        ));
    }

    #[tokio::test]
    async fn test_change_addresses_follow_color_sets() {
        let (spec, _) = fixture().await;
        assert_eq!(spec.change_address(0).await.unwrap(), "plain");
        assert_eq!(spec.change_address(1).await.unwrap(), "blue");
        assert!(spec.change_address(2).await.is_err());
    }

    #[tokio::test]
    async fn test_compose_through_store() {
        let (mut spec, _) = fixture().await;
        spec.add_target("dest", 1, 600);
        spec.add_target("dest", 0, 100);

        let def = ColorMap::builder()
            .with_descriptor(BLUE)
            .unwrap()
            .build()
            .color_definition(1)
            .unwrap();
        let draft = def.compose_tx_spec(&spec).await.unwrap();

        assert_eq!(draft.inputs.len(), 3);
        let outputs: Vec<(&str, u64)> = draft
            .outputs
            .iter()
            .map(|o| (o.address.as_str(), o.value))
            .collect();
        assert_eq!(
            outputs,
            vec![("dest", 600), ("blue", 100), ("dest", 100), ("plain", 1_150)]
        );
    }
}
