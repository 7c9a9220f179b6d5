//! Color definitions and the kernels that propagate color through transactions
//!
//! A color definition is constructed once from a color descriptor and is
//! immutable afterwards. Its kernel is a pure function from a transaction and
//! the colorstates of its inputs to the colorstates of its outputs.
//!
//! Kernel implementations are selected by an explicit match on the
//! descriptor's class code ([`ColorClass`]); there is no runtime registration.

pub mod color_map;
pub mod descriptor;
pub mod obc;

pub use color_map::*;
pub use descriptor::*;
pub use obc::*;

use crate::{
    data_structures::{
        color_state::ColorState,
        transaction::Transaction,
        types::{ColorId, UNCOLORED_COLOR_ID},
    },
    errors::ColorWalletResult,
};

/// Capability shared by every color kernel
pub trait ColorKernel {
    fn color_id(&self) -> ColorId;

    /// Height below which no transaction can carry this color
    fn starting_height(&self) -> Option<u64> {
        None
    }

    /// True when `tx` needs kernel evaluation even without colored inputs
    fn is_special_tx(&self, _tx: &Transaction) -> bool {
        false
    }

    /// Colorstate of every output of `tx`, in output order.
    ///
    /// The default colors nothing.
    fn run_kernel(
        &self,
        tx: &Transaction,
        _in_colorstates: &[Option<ColorState>],
    ) -> ColorWalletResult<Vec<Option<ColorState>>> {
        Ok(vec![None; tx.outputs.len()])
    }
}

/// Fallback definition for coins that carry no color
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UncoloredDefinition;

impl ColorKernel for UncoloredDefinition {
    fn color_id(&self) -> ColorId {
        UNCOLORED_COLOR_ID
    }
}

/// A color definition of any supported class
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorDefinition {
    Uncolored(UncoloredDefinition),
    OrderBased(ObColorDefinition),
}

impl ColorDefinition {
    /// Build the definition described by `descriptor` under `color_id`
    pub fn from_descriptor(
        color_id: ColorId,
        descriptor: &ColorDescriptor,
    ) -> ColorWalletResult<Self> {
        match descriptor {
            ColorDescriptor::OrderBased { genesis } => Ok(Self::OrderBased(
                ObColorDefinition::new(color_id, *genesis)?,
            )),
        }
    }

    /// Parse a descriptor string and build its definition
    pub fn from_color_desc(color_id: ColorId, color_desc: &str) -> ColorWalletResult<Self> {
        Self::from_descriptor(color_id, &ColorDescriptor::parse(color_desc)?)
    }

    pub fn class(&self) -> Option<ColorClass> {
        match self {
            Self::Uncolored(_) => None,
            Self::OrderBased(_) => Some(ColorClass::OrderBased),
        }
    }

    pub fn genesis(&self) -> Option<&Genesis> {
        match self {
            Self::Uncolored(_) => None,
            Self::OrderBased(def) => Some(def.genesis()),
        }
    }

    pub fn as_order_based(&self) -> Option<&ObColorDefinition> {
        match self {
            Self::OrderBased(def) => Some(def),
            _ => None,
        }
    }
}

impl ColorKernel for ColorDefinition {
    fn color_id(&self) -> ColorId {
        match self {
            Self::Uncolored(def) => def.color_id(),
            Self::OrderBased(def) => def.color_id(),
        }
    }

    fn starting_height(&self) -> Option<u64> {
        match self {
            Self::Uncolored(def) => def.starting_height(),
            Self::OrderBased(def) => def.starting_height(),
        }
    }

    fn is_special_tx(&self, tx: &Transaction) -> bool {
        match self {
            Self::Uncolored(def) => def.is_special_tx(tx),
            Self::OrderBased(def) => def.is_special_tx(tx),
        }
    }

    fn run_kernel(
        &self,
        tx: &Transaction,
        in_colorstates: &[Option<ColorState>],
    ) -> ColorWalletResult<Vec<Option<ColorState>>> {
        match self {
            Self::Uncolored(def) => def.run_kernel(tx, in_colorstates),
            Self::OrderBased(def) => def.run_kernel(tx, in_colorstates),
        }
    }
}
