//! Color values of outputs, backed by the color-value cache
//!
//! [`ColorData`] answers "which colors does this output carry" by reading the
//! cache and, when the cache has not seen the transaction yet, evaluating the
//! color graph first. A miss is therefore never mistaken for "uncolored".

pub mod builder;
pub mod store;

pub use builder::*;
pub use store::*;

use std::{collections::BTreeSet, sync::Arc};

use crate::{
    colordef::ColorMap,
    data_structures::{
        color_state::ColorValue,
        types::{ColorId, TxHash, UNCOLORED_COLOR_ID},
    },
    errors::ColorWalletResult,
};

pub struct ColorData {
    store: Arc<dyn ColorDataStore>,
    builder: ColorDataBuilder,
    color_map: Arc<ColorMap>,
}

impl ColorData {
    pub fn new(
        store: Arc<dyn ColorDataStore>,
        graph: Arc<dyn ColorGraphSource>,
        color_map: Arc<ColorMap>,
    ) -> Self {
        Self {
            builder: ColorDataBuilder::new(store.clone(), graph),
            store,
            color_map,
        }
    }

    pub fn color_map(&self) -> &ColorMap {
        &self.color_map
    }

    pub fn builder(&self) -> &ColorDataBuilder {
        &self.builder
    }

    /// Colorvalues of one output for the requested colors.
    ///
    /// The uncolored marker is never reported; an empty result means the
    /// output carries none of the requested colors.
    pub async fn get_colorvalues(
        &self,
        color_ids: &BTreeSet<ColorId>,
        txhash: &TxHash,
        outindex: u32,
    ) -> ColorWalletResult<Vec<ColorValue>> {
        let mut colorvalues = Vec::new();
        for &color_id in color_ids.iter().filter(|id| **id != UNCOLORED_COLOR_ID) {
            let mut state = self.store.get(color_id, txhash, outindex).await?;
            if state.is_none() && !self.store.is_scanned(color_id, txhash).await? {
                let def = self.color_map.color_definition(color_id)?;
                self.builder.ensure_scanned(&def, txhash).await?;
                state = self.store.get(color_id, txhash, outindex).await?;
            }
            if let Some(state) = state {
                colorvalues.push(ColorValue::new(color_id, state.value));
            }
        }
        Ok(colorvalues)
    }
}
