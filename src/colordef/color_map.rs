//! Mapping between color ids and color descriptors
//!
//! The map is assembled once with [`ColorMapBuilder`] and is read-only
//! afterwards. Ids are assigned sequentially starting at 1; id 0 is the
//! uncolored marker and corresponds to the empty descriptor.

use std::collections::{BTreeMap, HashMap};

use crate::{
    colordef::{ColorDefinition, ColorDescriptor, UncoloredDefinition},
    data_structures::types::{ColorId, UNCOLORED_COLOR_ID},
    errors::{ColorWalletError, ColorWalletResult},
};

/// Descriptor string standing for uncolored coins
pub const UNCOLORED_DESCRIPTOR: &str = "";

/// Immutable color id <-> descriptor table
#[derive(Debug, Clone, Default)]
pub struct ColorMap {
    by_id: BTreeMap<ColorId, ColorDescriptor>,
    by_descriptor: HashMap<ColorDescriptor, ColorId>,
}

impl ColorMap {
    pub fn builder() -> ColorMapBuilder {
        ColorMapBuilder::new()
    }

    /// Color id of a descriptor string; the empty descriptor is the uncolored marker
    pub fn resolve(&self, color_desc: &str) -> ColorWalletResult<ColorId> {
        if color_desc == UNCOLORED_DESCRIPTOR {
            return Ok(UNCOLORED_COLOR_ID);
        }
        let descriptor = ColorDescriptor::parse(color_desc)?;
        self.by_descriptor.get(&descriptor).copied().ok_or_else(|| {
            ColorWalletError::Configuration(format!("color '{color_desc}' is not in the color map"))
        })
    }

    pub fn find_descriptor(&self, color_id: ColorId) -> Option<&ColorDescriptor> {
        self.by_id.get(&color_id)
    }

    /// Descriptor string of a color id, `""` for the uncolored marker
    pub fn descriptor_string(&self, color_id: ColorId) -> ColorWalletResult<String> {
        if color_id == UNCOLORED_COLOR_ID {
            return Ok(UNCOLORED_DESCRIPTOR.to_string());
        }
        self.find_descriptor(color_id)
            .map(ToString::to_string)
            .ok_or_else(|| unknown_color(color_id))
    }

    /// Kernel for a color id
    pub fn color_definition(&self, color_id: ColorId) -> ColorWalletResult<ColorDefinition> {
        if color_id == UNCOLORED_COLOR_ID {
            return Ok(ColorDefinition::Uncolored(UncoloredDefinition));
        }
        let descriptor = self
            .find_descriptor(color_id)
            .ok_or_else(|| unknown_color(color_id))?;
        ColorDefinition::from_descriptor(color_id, descriptor)
    }

    pub fn color_ids(&self) -> impl Iterator<Item = ColorId> + '_ {
        self.by_id.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

fn unknown_color(color_id: ColorId) -> ColorWalletError {
    ColorWalletError::Configuration(format!("color id {color_id} is not in the color map"))
}

/// Builder for [`ColorMap`]
#[derive(Debug, Default)]
pub struct ColorMapBuilder {
    map: ColorMap,
}

impl ColorMapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor under the next free id. Already known descriptors
    /// keep their id.
    pub fn with_descriptor(mut self, color_desc: &str) -> ColorWalletResult<Self> {
        if color_desc == UNCOLORED_DESCRIPTOR {
            return Ok(self);
        }
        let descriptor = ColorDescriptor::parse(color_desc)?;
        if !self.map.by_descriptor.contains_key(&descriptor) {
            let next_id = self
                .map
                .by_id
                .keys()
                .next_back()
                .map_or(UNCOLORED_COLOR_ID + 1, |id| id + 1);
            self.insert(next_id, descriptor);
        }
        Ok(self)
    }

    pub fn with_descriptors<I, S>(self, color_descs: I) -> ColorWalletResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        color_descs
            .into_iter()
            .try_fold(self, |builder, desc| builder.with_descriptor(desc.as_ref()))
    }

    /// Register a descriptor under an explicit id, as when reloading a saved map
    pub fn with_entry(mut self, color_id: ColorId, color_desc: &str) -> ColorWalletResult<Self> {
        if color_id == UNCOLORED_COLOR_ID {
            return Err(ColorWalletError::Configuration(format!(
                "color id {UNCOLORED_COLOR_ID} is reserved for uncolored coins"
            )));
        }
        let descriptor = ColorDescriptor::parse(color_desc)?;
        match (
            self.map.by_id.get(&color_id),
            self.map.by_descriptor.get(&descriptor),
        ) {
            (None, None) => self.insert(color_id, descriptor),
            (Some(existing), Some(id)) if *existing == descriptor && *id == color_id => {}
            _ => {
                return Err(ColorWalletError::Configuration(format!(
                    "color id {color_id} or descriptor '{color_desc}' is already mapped"
                )))
            }
        }
        Ok(self)
    }

    pub fn build(self) -> ColorMap {
        self.map
    }

    fn insert(&mut self, color_id: ColorId, descriptor: ColorDescriptor) {
        self.map.by_id.insert(color_id, descriptor);
        self.map.by_descriptor.insert(descriptor, color_id);
    }
}
