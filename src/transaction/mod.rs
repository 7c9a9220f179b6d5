//! Composition of unsigned transaction drafts

pub mod composer;
pub mod operational;
pub mod tx_spec;

pub use composer::*;
pub use operational::*;
pub use tx_spec::*;
