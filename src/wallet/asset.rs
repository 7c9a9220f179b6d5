//! Asset definitions: a named color set whose coins are counted together

use serde::{Deserialize, Serialize};

use crate::{
    colordef::ColorMap,
    data_structures::{color_set::ColorSet, utxo::Utxo},
    errors::{ColorWalletError, ColorWalletResult},
    query::UtxoQuery,
};

/// Moniker of the uncolored asset
pub const BITCOIN_MONIKER: &str = "bitcoin";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDefinition {
    pub monikers: Vec<String>,
    pub color_set: ColorSet,
}

impl AssetDefinition {
    pub fn new(monikers: Vec<String>, color_set: ColorSet) -> Self {
        Self {
            monikers,
            color_set,
        }
    }

    /// Asset over the descriptors of `color_map`
    pub fn from_descriptors<I, S>(
        color_map: &ColorMap,
        monikers: Vec<String>,
        color_descs: I,
    ) -> ColorWalletResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self::new(
            monikers,
            ColorSet::from_descriptors(color_map, color_descs)?,
        ))
    }

    /// The uncolored asset
    pub fn bitcoin() -> Self {
        Self::new(vec![BITCOIN_MONIKER.to_string()], ColorSet::uncolored())
    }

    pub fn has_moniker(&self, moniker: &str) -> bool {
        self.monikers.iter().any(|m| m == moniker)
    }

    /// Amount of this asset held by one UTXO.
    ///
    /// Uncolored assets count the satoshi value. Colored assets need the
    /// UTXO's colorvalues, as attached by a query.
    pub fn colorvalue(&self, utxo: &Utxo) -> ColorWalletResult<u64> {
        if self.color_set.is_uncolored_only() {
            return Ok(utxo.value);
        }
        utxo.colorvalues
            .iter()
            .flatten()
            .find(|cv| self.color_set.has_color_id(cv.color_id))
            .map(|cv| cv.value)
            .ok_or_else(|| {
                ColorWalletError::ResourceNotFound(format!(
                    "no colorvalue of the asset for {}",
                    utxo.outpoint()
                ))
            })
    }

    /// Sum of [`Self::colorvalue`] over `utxos`
    pub fn total_colorvalue(&self, utxos: &[Utxo]) -> ColorWalletResult<u64> {
        utxos.iter().try_fold(0u64, |total, utxo| {
            let value = self.colorvalue(utxo)?;
            total.checked_add(value).ok_or_else(|| {
                ColorWalletError::InvalidArgument {
                    argument: "utxos".to_string(),
                    value: value.to_string(),
                    message: "asset total overflows".to_string(),
                }
            })
        })
    }

    /// Amount of this asset across the UTXOs `query` returns
    pub async fn balance(&self, query: &UtxoQuery) -> ColorWalletResult<u64> {
        self.total_colorvalue(&query.result().await?)
    }
}
