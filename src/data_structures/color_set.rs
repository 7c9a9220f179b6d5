//! Sets of colors declared by an asset or a wallet address

use std::collections::BTreeSet;

use blake2::{Blake2b, Digest};
use digest::consts::U32;
use serde::{Deserialize, Serialize};

use crate::{
    colordef::{ColorDescriptor, ColorMap, UNCOLORED_DESCRIPTOR},
    data_structures::types::{ColorId, TxHash, UNCOLORED_COLOR_ID},
    errors::ColorWalletResult,
};

/// A set of colors together with the descriptors they were resolved from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorSet {
    color_desc_list: Vec<String>,
    color_id_set: BTreeSet<ColorId>,
}

impl ColorSet {
    /// Resolve descriptor strings through the color map
    pub fn from_descriptors<I, S>(color_map: &ColorMap, color_descs: I) -> ColorWalletResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let color_desc_list: Vec<String> = color_descs.into_iter().map(Into::into).collect();
        let color_id_set = color_desc_list
            .iter()
            .map(|desc| color_map.resolve(desc))
            .collect::<ColorWalletResult<_>>()?;
        Ok(Self {
            color_desc_list,
            color_id_set,
        })
    }

    /// Look up the descriptors of already-known color ids
    pub fn from_color_ids<I>(color_map: &ColorMap, color_ids: I) -> ColorWalletResult<Self>
    where
        I: IntoIterator<Item = ColorId>,
    {
        let color_id_set: BTreeSet<ColorId> = color_ids.into_iter().collect();
        let color_desc_list = color_id_set
            .iter()
            .map(|id| color_map.descriptor_string(*id))
            .collect::<ColorWalletResult<_>>()?;
        Ok(Self {
            color_desc_list,
            color_id_set,
        })
    }

    /// The set `{0}`
    pub fn uncolored() -> Self {
        Self {
            color_desc_list: vec![UNCOLORED_DESCRIPTOR.to_string()],
            color_id_set: BTreeSet::from([UNCOLORED_COLOR_ID]),
        }
    }

    pub fn color_desc_list(&self) -> &[String] {
        &self.color_desc_list
    }

    pub fn color_ids(&self) -> &BTreeSet<ColorId> {
        &self.color_id_set
    }

    pub fn has_color_id(&self, color_id: ColorId) -> bool {
        self.color_id_set.contains(&color_id)
    }

    pub fn intersects(&self, other: &ColorSet) -> bool {
        !self.color_id_set.is_disjoint(&other.color_id_set)
    }

    /// Same colors, regardless of descriptor order
    pub fn equals(&self, other: &ColorSet) -> bool {
        self.color_id_set == other.color_id_set
    }

    /// True when the set is exactly `{0}`
    pub fn is_uncolored_only(&self) -> bool {
        self.color_id_set.len() == 1 && self.has_color_id(UNCOLORED_COLOR_ID)
    }

    /// Genesis transactions of the colored members
    pub fn genesis_txhashes(&self) -> Vec<TxHash> {
        self.color_desc_list
            .iter()
            .filter(|desc| !desc.is_empty())
            .filter_map(|desc| ColorDescriptor::parse(desc).ok())
            .map(|desc| desc.genesis().txhash)
            .collect()
    }

    /// Deterministic fingerprint of the set, independent of descriptor order
    pub fn hash_string(&self) -> ColorWalletResult<String> {
        let mut sorted = self.color_desc_list.clone();
        sorted.sort();
        let json = serde_json::to_vec(&sorted)?;
        let digest = Blake2b::<U32>::digest(&json);
        Ok(hex::encode(digest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLUE: &str = "obc:b1586cd10b32f78795b86e9a3febe58dcb59189175fad884a7f4a6623b77486e:0:46442";
    const RED: &str = "obc:8f6c8751f39357cd42af97a67301127d497597ae699ad0670b4f649bd9e39abf:0:46444";

    fn color_map() -> ColorMap {
        ColorMap::builder()
            .with_descriptors([BLUE, RED])
            .unwrap()
            .build()
    }

    #[test]
    fn test_from_descriptors() {
        let map = color_map();
        let set = ColorSet::from_descriptors(&map, [BLUE, ""]).unwrap();
        assert!(set.has_color_id(1));
        assert!(set.has_color_id(0));
        assert!(!set.has_color_id(2));
        assert!(!set.is_uncolored_only());
        assert_eq!(set.genesis_txhashes().len(), 1);
    }

    #[test]
    fn test_from_color_ids() {
        let map = color_map();
        let set = ColorSet::from_color_ids(&map, [2]).unwrap();
        assert_eq!(set.color_desc_list(), &[RED.to_string()]);
        assert!(ColorSet::from_color_ids(&map, [7]).is_err());

        let uncolored = ColorSet::from_color_ids(&map, [0]).unwrap();
        assert!(uncolored.is_uncolored_only());
        assert!(uncolored.equals(&ColorSet::uncolored()));
    }

    #[test]
    fn test_intersects() {
        let map = color_map();
        let blue = ColorSet::from_descriptors(&map, [BLUE]).unwrap();
        let both = ColorSet::from_descriptors(&map, [RED, BLUE]).unwrap();
        assert!(blue.intersects(&both));
        assert!(!blue.intersects(&ColorSet::uncolored()));
    }

    #[test]
    fn test_hash_string_is_order_independent() {
        let map = color_map();
        let a = ColorSet::from_descriptors(&map, [BLUE, RED]).unwrap();
        let b = ColorSet::from_descriptors(&map, [RED, BLUE]).unwrap();
        let blue = ColorSet::from_descriptors(&map, [BLUE]).unwrap();
        assert_eq!(a.hash_string().unwrap(), b.hash_string().unwrap());
        assert_ne!(a.hash_string().unwrap(), blue.hash_string().unwrap());
        assert_eq!(a.hash_string().unwrap().len(), 64);
    }
}
