//! Primitive identifiers shared by the kernel, the stores and the composer

use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::ColorWalletError;

/// Opaque color identifier
pub type ColorId = u32;

/// The reserved "uncolored" marker, never assigned to a real color
pub const UNCOLORED_COLOR_ID: ColorId = 0;

/// 32-byte transaction hash, rendered as 64 lowercase hex characters
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TxHash([u8; 32]);

impl TxHash {
    pub const LEN: usize = 32;

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The all-zero hash, used by the null (coinbase) outpoint
    pub fn zero() -> Self {
        Self([0u8; 32])
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, ColorWalletError> {
        let bytes = hex::decode(s)?;
        let array: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            ColorWalletError::Parse(format!(
                "transaction hash must be {} bytes, got {}",
                Self::LEN,
                b.len()
            ))
        })?;
        Ok(Self(array))
    }
}

impl Display for TxHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::fmt::Debug for TxHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "TxHash({})", self.to_hex())
    }
}

impl FromStr for TxHash {
    type Err = ColorWalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; 32]> for TxHash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl Serialize for TxHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for TxHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        TxHash::from_hex(&s).map_err(de::Error::custom)
    }
}

/// Reference to one output of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutPoint {
    pub txhash: TxHash,
    pub outindex: u32,
}

impl OutPoint {
    pub fn new(txhash: TxHash, outindex: u32) -> Self {
        Self { txhash, outindex }
    }

    /// The outpoint referenced by coinbase inputs
    pub fn null() -> Self {
        Self {
            txhash: TxHash::zero(),
            outindex: u32::MAX,
        }
    }

    pub fn is_null(&self) -> bool {
        self.txhash.is_zero() && self.outindex == u32::MAX
    }
}

impl Display for OutPoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.txhash, self.outindex)
    }
}
