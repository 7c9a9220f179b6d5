//! External chain sources and UTXO synchronization
//!
//! The HTTP explorer source requires the `http` feature.

#[cfg(feature = "http")]
pub mod http_source;
pub mod mocks;
pub mod synchronizer;
pub mod utxo_source;

#[cfg(feature = "http")]
pub use http_source::*;
pub use mocks::*;
pub use synchronizer::*;
pub use utxo_source::*;
