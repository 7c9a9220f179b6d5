//! UTXO/color queries
//!
//! Joins UTXO rows with the colorvalues of their outputs to answer "which
//! coins back color set C".

use std::sync::Arc;

use crate::{
    color_data::ColorData,
    data_structures::{color_set::ColorSet, types::UNCOLORED_COLOR_ID, utxo::Utxo},
    errors::ColorWalletResult,
    storage::UtxoStore,
    wallet::{
        address_registry::{AddressRecord, AddressRegistry},
        asset::AssetDefinition,
    },
};

/// Query for the UTXOs that carry any color of a color set
pub struct UtxoQuery {
    color_set: ColorSet,
    store: Arc<dyn UtxoStore>,
    color_data: Arc<ColorData>,
    registry: Arc<dyn AddressRegistry>,
}

impl UtxoQuery {
    pub fn new(
        color_set: ColorSet,
        store: Arc<dyn UtxoStore>,
        color_data: Arc<ColorData>,
        registry: Arc<dyn AddressRegistry>,
    ) -> Self {
        Self {
            color_set,
            store,
            color_data,
            registry,
        }
    }

    /// Query over the color set of `asset`
    pub fn for_asset(
        asset: &AssetDefinition,
        store: Arc<dyn UtxoStore>,
        color_data: Arc<ColorData>,
        registry: Arc<dyn AddressRegistry>,
    ) -> Self {
        Self::new(asset.color_set.clone(), store, color_data, registry)
    }

    pub fn color_set(&self) -> &ColorSet {
        &self.color_set
    }

    /// UTXOs at one address that are relevant to the query's color set.
    ///
    /// An address declared uncolored-only returns all of its UTXOs without
    /// resolving any colorvalues.
    pub async fn for_address(&self, address_rec: &AddressRecord) -> ColorWalletResult<Vec<Utxo>> {
        let mut utxos = self.store.for_address(&address_rec.address).await?;
        let address_is_uncolored = address_rec.color_set.is_uncolored_only();

        for utxo in utxos.iter_mut() {
            utxo.address_rec = Some(address_rec.clone());
            if !address_is_uncolored {
                let colorvalues = self
                    .color_data
                    .get_colorvalues(address_rec.color_set.color_ids(), &utxo.txhash, utxo.outindex)
                    .await?;
                utxo.colorvalues = Some(colorvalues);
            }
        }

        if address_is_uncolored {
            return Ok(utxos);
        }
        utxos.retain(|utxo| self.is_relevant(utxo));
        Ok(utxos)
    }

    fn is_relevant(&self, utxo: &Utxo) -> bool {
        match utxo.colorvalues.as_deref() {
            None | Some([]) => self.color_set.has_color_id(UNCOLORED_COLOR_ID),
            Some(colorvalues) => colorvalues
                .iter()
                .any(|cv| self.color_set.has_color_id(cv.color_id)),
        }
    }

    /// UTXOs of every wallet address associated with the color set
    pub async fn result(&self) -> ColorWalletResult<Vec<Utxo>> {
        let addresses = self.registry.addresses_for_color_set(&self.color_set).await?;
        let mut utxos = Vec::new();
        for address_rec in &addresses {
            utxos.extend(self.for_address(address_rec).await?);
        }
        Ok(utxos)
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
        wallet::address_registry::MemoryAddressRegistry,
    };

    const BLUE: &str = "obc:b1586cd10b32f78795b86e9a3febe58dcb59189175fad884a7f4a6623b77486e:0:46442";

    fn hash(b: u8) -> TxHash {
        TxHash::new([b; 32])
    }

    struct Fixture {
        storage: Arc<MemoryStorage>,
        color_data: Arc<ColorData>,
        registry: Arc<MemoryAddressRegistry>,
        blue: ColorSet,
    }

    fn fixture() -> Fixture {
        let map = Arc::new(ColorMap::builder().with_descriptor(BLUE).unwrap().build());
        let storage = Arc::new(MemoryStorage::new());
        // an empty graph: any evaluation attempt fails
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
        Fixture {
            storage,
            color_data,
            registry,
            blue,
        }
    }

    fn query(f: &Fixture, color_set: ColorSet) -> UtxoQuery {
        UtxoQuery::new(color_set, f.storage.clone(), f.color_data.clone(), f.registry.clone())
    }

    #[tokio::test]
    async fn test_uncolored_address_skips_color_resolution() {
        let f = fixture();
        for i in 0..3 {
            f.storage
                .add(&Utxo::new("plain", hash(1), i, 100, vec![]))
                .await
                .unwrap();
        }

        let utxos = query(&f, ColorSet::uncolored())
            .for_address(&AddressRecord::new("plain", ColorSet::uncolored()))
            .await
            .unwrap();
        assert_eq!(utxos.len(), 3);
        assert!(utxos.iter().all(|u| u.colorvalues.is_none()));
        assert!(utxos.iter().all(|u| u.address_rec.is_some()));
    }

    #[tokio::test]
    async fn test_colored_address_filters_by_colorvalues() {
        let f = fixture();
        f.storage.add(&Utxo::new("blue", hash(2), 0, 600, vec![])).await.unwrap();
        f.storage.add(&Utxo::new("blue", hash(2), 1, 400, vec![])).await.unwrap();
        f.storage.put(1, &hash(2), 0, &ColorState::new(600)).await.unwrap();
        f.storage.mark_scanned(1, &hash(2)).await.unwrap();

        let blue_utxos = query(&f, f.blue.clone()).result().await.unwrap();
        assert_eq!(blue_utxos.len(), 1);
        assert_eq!(blue_utxos[0].outindex, 0);
        assert_eq!(
            blue_utxos[0].colorvalues.as_ref().unwrap()[0].value,
            600
        );

        // the uncolored query keeps only the uncolored output of the blue address
        let blue_rec = AddressRecord::new("blue", f.blue.clone());
        let plain = query(&f, ColorSet::uncolored())
            .for_address(&blue_rec)
            .await
            .unwrap();
        assert_eq!(plain.len(), 1);
        assert_eq!(plain[0].outindex, 1);
    }

    #[tokio::test]
    async fn test_result_only_visits_matching_addresses() {
        let f = fixture();
        f.storage.add(&Utxo::new("plain", hash(3), 0, 100, vec![])).await.unwrap();
        f.storage.add(&Utxo::new("blue", hash(4), 0, 100, vec![])).await.unwrap();
        f.storage.mark_scanned(1, &hash(4)).await.unwrap();

        let plain = query(&f, ColorSet::uncolored()).result().await.unwrap();
        assert_eq!(plain.len(), 1);
        assert_eq!(plain[0].address, "plain");

        // the blue output is not colored, so a blue query finds nothing
        assert!(query(&f, f.blue.clone()).result().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cache_miss_is_not_uncolored() {
        let f = fixture();
        f.storage.add(&Utxo::new("blue", hash(5), 0, 100, vec![])).await.unwrap();
        // not scanned and not in the graph: evaluation is attempted and fails
        assert!(query(&f, f.blue.clone()).result().await.is_err());
    }
}
