//! Order-based coloring (OBC) kernel
//!
//! Color follows value by position. Inputs and outputs are laid end to end
//! and walked in order; an output is colored when every input whose value was
//! consumed to cover it (since the last point where cumulative input and
//! cumulative output values were aligned) is colored. Outputs that do not
//! start on an alignment boundary inherit the state of the segment they fall
//! in. The genesis output is colored unconditionally, and outputs sharing its
//! segment inherit that state; this is the only way new color comes into
//! existence.

use crate::{
    colordef::{descriptor::Genesis, ColorKernel},
    data_structures::{
        color_state::ColorState,
        transaction::Transaction,
        types::{ColorId, UNCOLORED_COLOR_ID},
    },
    errors::{ColorWalletError, ColorWalletResult},
};

/// Order-based color definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObColorDefinition {
    color_id: ColorId,
    genesis: Genesis,
}

impl ObColorDefinition {
    pub const CLASS_CODE: &'static str = "obc";

    pub fn new(color_id: ColorId, genesis: Genesis) -> ColorWalletResult<Self> {
        if color_id == UNCOLORED_COLOR_ID {
            return Err(ColorWalletError::Configuration(format!(
                "color id {UNCOLORED_COLOR_ID} is reserved for uncolored coins"
            )));
        }
        Ok(Self { color_id, genesis })
    }

    pub fn genesis(&self) -> &Genesis {
        &self.genesis
    }

    fn is_genesis_output(&self, tx: &Transaction, out_index: usize) -> bool {
        tx.hash == self.genesis.txhash && out_index == self.genesis.outindex as usize
    }
}

impl ColorKernel for ObColorDefinition {
    fn color_id(&self) -> ColorId {
        self.color_id
    }

    fn starting_height(&self) -> Option<u64> {
        Some(self.genesis.height)
    }

    fn is_special_tx(&self, tx: &Transaction) -> bool {
        tx.hash == self.genesis.txhash
    }

    fn run_kernel(
        &self,
        tx: &Transaction,
        in_colorstates: &[Option<ColorState>],
    ) -> ColorWalletResult<Vec<Option<ColorState>>> {
        let input_values = tx.input_values()?;
        if in_colorstates.len() != input_values.len() {
            return Err(ColorWalletError::kernel(
                tx.hash,
                format!(
                    "{} input colorstates for {} inputs",
                    in_colorstates.len(),
                    input_values.len()
                ),
            ));
        }

        let mut out_colorstates = Vec::with_capacity(tx.outputs.len());
        // Input value consumed but not yet assigned to an output
        let mut cur_value: u64 = 0;
        let mut colored = false;
        let mut inp_index = 0;

        for (out_index, output) in tx.outputs.iter().enumerate() {
            if cur_value == 0 {
                colored = true;
            }
            while cur_value < output.value {
                let value = *input_values.get(inp_index).ok_or_else(|| {
                    ColorWalletError::kernel(
                        tx.hash,
                        format!("inputs exhausted while covering output {out_index}"),
                    )
                })?;
                cur_value = cur_value.checked_add(value).ok_or_else(|| {
                    ColorWalletError::kernel(tx.hash, "input value overflow")
                })?;
                if colored {
                    colored = in_colorstates[inp_index].is_some();
                }
                inp_index += 1;
            }

            if self.is_genesis_output(tx, out_index) {
                colored = true;
            }
            out_colorstates.push(colored.then(|| ColorState::new(output.value)));

            cur_value -= output.value;
        }

        Ok(out_colorstates)
    }
}
