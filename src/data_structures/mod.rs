//! Core data types: identifiers, transactions, colorstates, color sets and UTXOs

pub mod color_set;
pub mod color_state;
pub mod transaction;
pub mod types;
pub mod utxo;

pub use color_set::*;
pub use color_state::*;
pub use transaction::*;
pub use types::*;
pub use utxo::*;
