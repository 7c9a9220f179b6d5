//! Color-value cache abstraction
//!
//! The cache holds the kernel result of every colored output, keyed by
//! `(color_id, txhash, outindex)`, and remembers which transactions were
//! already evaluated for each color. An absent entry for an evaluated
//! transaction means the output does not carry that color; an absent entry
//! for an unevaluated transaction means nothing.

use async_trait::async_trait;

use crate::{
    data_structures::{
        color_state::{ColorState, ColorValue},
        types::{ColorId, TxHash},
    },
    errors::ColorWalletResult,
};

#[async_trait]
pub trait ColorDataStore: Send + Sync {
    /// Cached colorstate of an output, `None` on a miss
    async fn get(
        &self,
        color_id: ColorId,
        txhash: &TxHash,
        outindex: u32,
    ) -> ColorWalletResult<Option<ColorState>>;

    /// Record a colorstate. Entries are write-once: repeating the same value
    /// is a no-op and a different value is a `ConstraintViolation`.
    async fn put(
        &self,
        color_id: ColorId,
        txhash: &TxHash,
        outindex: u32,
        state: &ColorState,
    ) -> ColorWalletResult<()>;

    /// Every cached color of an output
    async fn get_any(&self, txhash: &TxHash, outindex: u32) -> ColorWalletResult<Vec<ColorValue>>;

    /// Remember that `txhash` was evaluated for `color_id`
    async fn mark_scanned(&self, color_id: ColorId, txhash: &TxHash) -> ColorWalletResult<()>;

    async fn is_scanned(&self, color_id: ColorId, txhash: &TxHash) -> ColorWalletResult<bool>;
}
