//! Spend targets, composed drafts and the operational capability the
//! composer draws coins from

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    data_structures::{
        types::{ColorId, UNCOLORED_COLOR_ID},
        utxo::Utxo,
    },
    errors::ColorWalletResult,
};

/// A desired output: `value` units of `color_id` paid to `address`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorTarget {
    pub value: u64,
    pub color_id: ColorId,
    pub address: String,
}

impl ColorTarget {
    pub fn new(address: impl Into<String>, color_id: ColorId, value: u64) -> Self {
        Self {
            value,
            color_id,
            address: address.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedTxIn {
    pub utxo: Utxo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedTxOut {
    pub address: String,
    pub value: u64,
}

/// Unsigned transaction draft
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedTxSpec {
    pub inputs: Vec<ComposedTxIn>,
    pub outputs: Vec<ComposedTxOut>,
}

impl ComposedTxSpec {
    pub fn new(inputs: Vec<Utxo>, targets: &[ColorTarget]) -> Self {
        Self {
            inputs: inputs.into_iter().map(|utxo| ComposedTxIn { utxo }).collect(),
            outputs: targets
                .iter()
                .map(|target| ComposedTxOut {
                    address: target.address.clone(),
                    value: target.value,
                })
                .collect(),
        }
    }

    pub fn input_value(&self) -> u64 {
        self.inputs.iter().map(|input| input.utxo.value).sum()
    }

    pub fn output_value(&self) -> u64 {
        self.outputs.iter().map(|output| output.value).sum()
    }
}

/// What a composer needs from the wallet to turn targets into a draft
#[async_trait]
pub trait OperationalTxSpec: Send + Sync {
    fn targets(&self) -> Vec<ColorTarget>;

    /// Coins of `color_id` worth at least `value`, and their total
    async fn select_coins(&self, color_id: ColorId, value: u64)
        -> ColorWalletResult<(Vec<Utxo>, u64)>;

    fn required_fee(&self) -> u64;

    async fn change_address(&self, color_id: ColorId) -> ColorWalletResult<String>;

    /// Distinct color ids among the targets
    fn target_color_ids(&self) -> BTreeSet<ColorId> {
        self.targets().iter().map(|t| t.color_id).collect()
    }

    /// At least one target, and every target uncolored
    fn is_uncolored(&self) -> bool {
        self.target_color_ids().into_iter().eq([UNCOLORED_COLOR_ID])
    }

    /// At least one target, and every target of the same color
    fn is_monocolor(&self) -> bool {
        self.target_color_ids().len() == 1
    }
}
