//! Storage backends for UTXOs and cached colorvalues
//!
//! The [`UtxoStore`] trait is the UTXO persistence interface. Both backends
//! also implement the color-value cache ([`crate::color_data::ColorDataStore`])
//! so that a wallet keeps UTXOs and color results in one place. The SQLite
//! backend requires the `storage` feature.

pub mod memory;
#[cfg(feature = "storage")]
pub mod performance;
#[cfg(feature = "storage")]
pub mod sqlite;
pub mod utxo_store;

pub use memory::*;
#[cfg(feature = "storage")]
pub use performance::*;
#[cfg(feature = "storage")]
pub use sqlite::*;
pub use utxo_store::*;
