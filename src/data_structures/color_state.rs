use serde::{Deserialize, Serialize};

use crate::data_structures::types::ColorId;

/// Colored portion of one output as produced by a kernel run.
///
/// An uncolored output has no `ColorState` at all (`Option::None`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColorState {
    pub value: u64,
    /// Reserved for future metadata, always empty for now
    #[serde(default)]
    pub label: String,
}

impl ColorState {
    pub fn new(value: u64) -> Self {
        Self {
            value,
            label: String::new(),
        }
    }

    pub fn with_label(value: u64, label: impl Into<String>) -> Self {
        Self {
            value,
            label: label.into(),
        }
    }
}

/// Association of a color with a quantity, attached to one output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColorValue {
    pub color_id: ColorId,
    pub value: u64,
}

impl ColorValue {
    pub fn new(color_id: ColorId, value: u64) -> Self {
        Self { color_id, value }
    }
}
