//! Colored-coin wallet core
//!
//! This crate tracks which bitcoin outputs carry which colors and composes
//! transactions that move them. It provides:
//!
//! - the order-based coloring kernel and its descriptor codec ([`colordef`])
//! - a color-value cache filled by walking the color graph ([`color_data`])
//! - a UTXO store kept in sync with an external source ([`storage`], [`scanning`])
//! - queries joining UTXOs with colorvalues ([`query`])
//! - composition of unsigned transaction drafts ([`transaction`])
//!
//! ## Features
//!
//! - `storage`: SQLite persistence for UTXOs and color data
//! - `http`: HTTP block-explorer UTXO source
//!
//! Both are enabled by default. Without them, [`storage::MemoryStorage`] and
//! the mocks in [`scanning::mocks`] provide the same capabilities in memory.

pub mod color_data;
pub mod colordef;
pub mod config;
pub mod data_structures;
pub mod errors;
pub mod query;
pub mod scanning;
pub mod storage;
pub mod transaction;
pub mod wallet;

pub use color_data::{ColorData, ColorDataBuilder, ColorDataStore, ColorGraphSource};
pub use colordef::*;
pub use config::*;
pub use data_structures::*;
pub use errors::*;
pub use query::*;
pub use scanning::*;
pub use storage::*;
pub use transaction::*;
pub use wallet::*;
