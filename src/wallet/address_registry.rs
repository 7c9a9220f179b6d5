//! Wallet addresses and the color sets they are declared for
//!
//! Key management lives outside this crate; the registry only answers which
//! addresses exist, which colors each may hold, and where change should go.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    data_structures::color_set::ColorSet,
    errors::{ColorWalletError, ColorWalletResult},
};

/// A wallet address with its declared color set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    pub address: String,
    pub color_set: ColorSet,
}

impl AddressRecord {
    pub fn new(address: impl Into<String>, color_set: ColorSet) -> Self {
        Self {
            address: address.into(),
            color_set,
        }
    }
}

#[async_trait]
pub trait AddressRegistry: Send + Sync {
    async fn all_addresses(&self) -> ColorWalletResult<Vec<AddressRecord>>;

    /// Addresses whose color set shares at least one color with `color_set`
    async fn addresses_for_color_set(
        &self,
        color_set: &ColorSet,
    ) -> ColorWalletResult<Vec<AddressRecord>> {
        Ok(self
            .all_addresses()
            .await?
            .into_iter()
            .filter(|rec| color_set.intersects(&rec.color_set))
            .collect())
    }

    /// Address to receive change of `color_set`
    async fn change_address(&self, color_set: &ColorSet) -> ColorWalletResult<AddressRecord>;
}

/// Registry over a fixed list of addresses
#[derive(Debug, Clone, Default)]
pub struct MemoryAddressRegistry {
    addresses: Arc<RwLock<Vec<AddressRecord>>>,
}

impl MemoryAddressRegistry {
    pub fn new(addresses: Vec<AddressRecord>) -> Self {
        Self {
            addresses: Arc::new(RwLock::new(addresses)),
        }
    }

    pub fn add_address(&self, record: AddressRecord) {
        self.addresses
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(record);
    }
}

#[async_trait]
impl AddressRegistry for MemoryAddressRegistry {
    async fn all_addresses(&self) -> ColorWalletResult<Vec<AddressRecord>> {
        Ok(self
            .addresses
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone())
    }

    /// The first address declared for the set is reused
    async fn change_address(&self, color_set: &ColorSet) -> ColorWalletResult<AddressRecord> {
        self.addresses_for_color_set(color_set)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                ColorWalletError::ResourceNotFound(format!(
                    "no wallet address for color set {:?}",
                    color_set.color_ids()
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colordef::ColorMap;

    const BLUE: &str = "obc:b1586cd10b32f78795b86e9a3febe58dcb59189175fad884a7f4a6623b77486e:0:46442";

    #[tokio::test]
    async fn test_addresses_for_color_set() {
        let map = ColorMap::builder().with_descriptor(BLUE).unwrap().build();
        let blue = ColorSet::from_descriptors(&map, [BLUE]).unwrap();
        let registry = MemoryAddressRegistry::new(vec![
            AddressRecord::new("plain", ColorSet::uncolored()),
            AddressRecord::new("blue-1", blue.clone()),
        ]);
        registry.add_address(AddressRecord::new("blue-2", blue.clone()));

        assert_eq!(registry.all_addresses().await.unwrap().len(), 3);
        let blue_addrs = registry.addresses_for_color_set(&blue).await.unwrap();
        assert_eq!(
            blue_addrs.iter().map(|r| r.address.as_str()).collect::<Vec<_>>(),
            vec!["blue-1", "blue-2"]
        );
        assert_eq!(registry.change_address(&blue).await.unwrap().address, "blue-1");
        assert_eq!(
            registry.change_address(&ColorSet::uncolored()).await.unwrap().address,
            "plain"
        );
    }

    #[tokio::test]
    async fn test_change_address_missing() {
        let registry = MemoryAddressRegistry::default();
        assert!(matches!(
            registry.change_address(&ColorSet::uncolored()).await,
            Err(ColorWalletError::ResourceNotFound(_))
        ));
    }
}
