use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::{
    data_structures::{
        color_state::ColorValue,
        types::{OutPoint, TxHash},
    },
    scanning::utxo_source::SourceUtxo,
    wallet::address_registry::AddressRecord,
};

/// An unspent transaction output tracked by the wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    /// Row id in the store (database primary key)
    pub id: Option<i64>,
    pub address: String,
    pub txhash: TxHash,
    pub outindex: u32,
    pub value: u64,
    #[serde(with = "hex::serde")]
    pub script: Vec<u8>,
    pub scantime: u64, // unix seconds
    pub commitment: u64, // confirmations when fetched

    // Attached by queries, never persisted
    #[serde(skip)]
    pub address_rec: Option<AddressRecord>,
    #[serde(skip)]
    pub colorvalues: Option<Vec<ColorValue>>,
}

impl Utxo {
    /// New row scanned now with zero confirmations
    pub fn new(
        address: impl Into<String>,
        txhash: TxHash,
        outindex: u32,
        value: u64,
        script: Vec<u8>,
    ) -> Self {
        Self {
            id: None,
            address: address.into(),
            txhash,
            outindex,
            value,
            script,
            scantime: unix_now(),
            commitment: 0,
            address_rec: None,
            colorvalues: None,
        }
    }

    /// Row for an output reported by a UTXO source for `address`
    pub fn from_source(address: impl Into<String>, source: SourceUtxo) -> Self {
        let mut utxo = Self::new(
            address,
            source.txhash,
            source.outindex,
            source.value,
            source.script,
        );
        if let Some(scantime) = source.scantime {
            utxo.scantime = scantime;
        }
        utxo.commitment = source.confirmations.unwrap_or(0);
        utxo
    }

    pub fn with_scantime(mut self, scantime: u64) -> Self {
        self.scantime = scantime;
        self
    }

    pub fn with_commitment(mut self, commitment: u64) -> Self {
        self.commitment = commitment;
        self
    }

    pub fn outpoint(&self) -> OutPoint {
        OutPoint::new(self.txhash, self.outindex)
    }

    /// True when colorvalues were resolved and at least one is present
    pub fn is_colored(&self) -> bool {
        self.colorvalues.as_ref().is_some_and(|cvs| !cvs.is_empty())
    }
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_defaults() {
        let utxo = Utxo::new("addr", TxHash::new([1; 32]), 2, 5000, vec![0x76, 0xa9]);
        assert!(utxo.scantime > 0);
        assert_eq!(utxo.commitment, 0);
        assert_eq!(utxo.outpoint(), OutPoint::new(TxHash::new([1; 32]), 2));
        assert!(!utxo.is_colored());
    }

    #[test]
    fn test_from_source_keeps_supplied_fields() {
        let source = SourceUtxo {
            txhash: TxHash::new([3; 32]),
            outindex: 1,
            value: 700,
            script: vec![0xab],
            scantime: Some(1_400_000_000),
            confirmations: Some(6),
        };
        let utxo = Utxo::from_source("addr", source);
        assert_eq!(utxo.scantime, 1_400_000_000);
        assert_eq!(utxo.commitment, 6);
        assert_eq!(utxo.address, "addr");
    }

    #[test]
    fn test_serde_skips_transient_fields() {
        let mut utxo = Utxo::new("addr", TxHash::new([1; 32]), 0, 10, vec![0xff]);
        utxo.colorvalues = Some(vec![ColorValue::new(1, 10)]);
        let json = serde_json::to_string(&utxo).unwrap();
        assert!(json.contains("\"script\":\"ff\""));
        let back: Utxo = serde_json::from_str(&json).unwrap();
        assert!(back.colorvalues.is_none());
        assert_eq!(back.value, 10);
    }
}
