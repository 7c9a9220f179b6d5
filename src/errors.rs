//! Error types for the colored coin libraries
//!
//! A single error enum is shared by every module so that kernel, storage,
//! synchronization and composition failures can be propagated with `?`
//! across layer boundaries.

use thiserror::Error;

use crate::data_structures::types::{ColorId, TxHash};

/// Result alias used throughout the crate
pub type ColorWalletResult<T> = Result<T, ColorWalletError>;

/// Errors produced by the colored coin libraries
#[derive(Debug, Error)]
pub enum ColorWalletError {
    /// A color descriptor (or another textual identifier) could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// The kernel could not color a transaction (malformed input/output shape)
    #[error("Kernel execution failed for {txhash}: {message}")]
    KernelExecution { txhash: TxHash, message: String },

    /// Input values were not resolved before the kernel was invoked
    #[error("Input values of {txhash} are not resolved (input {input_index})")]
    InputResolution { txhash: TxHash, input_index: usize },

    /// Invalid configuration: unsupported color id, unknown backend, bad settings
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A uniqueness or write-once rule of the store was violated
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Storage backend failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// External UTXO/transaction source failure
    #[error("Network error: {0}")]
    Network(String),

    /// Coin selection was asked for a zero amount
    #[error("Cannot select coins for a zero amount of color {color_id}")]
    ZeroSelect { color_id: ColorId },

    /// Available coins do not cover the requested amount
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    /// Invalid argument passed to an operation
    #[error("Invalid argument {argument}={value}: {message}")]
    InvalidArgument {
        argument: String,
        value: String,
        message: String,
    },

    /// A collaborator could not supply a required record
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),
}

impl ColorWalletError {
    /// Shorthand for a kernel execution failure
    pub fn kernel(txhash: TxHash, message: impl Into<String>) -> Self {
        Self::KernelExecution {
            txhash,
            message: message.into(),
        }
    }

    /// True when the error is a recoverable, per-request failure of an
    /// external source rather than a local invariant violation
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Parse(_) | Self::ResourceNotFound(_)
        )
    }
}

impl From<serde_json::Error> for ColorWalletError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(format!("JSON: {e}"))
    }
}

impl From<hex::FromHexError> for ColorWalletError {
    fn from(e: hex::FromHexError) -> Self {
        Self::Parse(format!("hex: {e}"))
    }
}

#[cfg(feature = "storage")]
impl From<tokio_rusqlite::Error> for ColorWalletError {
    fn from(e: tokio_rusqlite::Error) -> Self {
        if let tokio_rusqlite::Error::Rusqlite(inner) = &e {
            if let rusqlite::Error::SqliteFailure(failure, msg) = inner {
                if failure.code == rusqlite::ErrorCode::ConstraintViolation {
                    return Self::ConstraintViolation(
                        msg.clone().unwrap_or_else(|| failure.to_string()),
                    );
                }
            }
        }
        Self::Storage(e.to_string())
    }
}
