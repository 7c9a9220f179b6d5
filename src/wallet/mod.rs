//! Wallet-side collaborators: addresses and asset definitions

pub mod address_registry;
pub mod asset;

pub use address_registry::*;
pub use asset::*;
