//! Base-chain transactions as consumed by the color kernel
//!
//! Only the parts of a transaction that coloring needs are modelled: the
//! hash, the ordered outputs `(value, script)` and the ordered inputs with the
//! values they spend. Input values are not carried on the wire, so they start
//! out unresolved and must be filled in from the previous transactions before
//! the kernel can run.

use serde::{Deserialize, Serialize};

use crate::{
    data_structures::types::{OutPoint, TxHash},
    errors::{ColorWalletError, ColorWalletResult},
    scanning::utxo_source::TransactionProvider,
};

/// Input of a transaction, with the value of the output it spends once resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    pub outpoint: OutPoint,
    /// Value of the spent output, `None` until resolved
    #[serde(default)]
    pub value: Option<u64>,
}

impl TxInput {
    pub fn new(outpoint: OutPoint) -> Self {
        Self {
            outpoint,
            value: None,
        }
    }

    pub fn with_value(outpoint: OutPoint, value: u64) -> Self {
        Self {
            outpoint,
            value: Some(value),
        }
    }

    pub fn coinbase() -> Self {
        Self::with_value(OutPoint::null(), 0)
    }

    pub fn is_coinbase(&self) -> bool {
        self.outpoint.is_null()
    }
}

/// Output of a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub value: u64,
    #[serde(with = "hex::serde")]
    pub script: Vec<u8>,
}

impl TxOutput {
    pub fn new(value: u64, script: Vec<u8>) -> Self {
        Self { value, script }
    }
}

/// A transaction as seen by the coloring layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub hash: TxHash,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
}

impl Transaction {
    pub fn new(hash: TxHash, inputs: Vec<TxInput>, outputs: Vec<TxOutput>) -> Self {
        Self {
            hash,
            inputs,
            outputs,
        }
    }

    /// True when every input carries its spent value
    pub fn has_input_values(&self) -> bool {
        self.inputs.iter().all(|input| input.value.is_some())
    }

    /// Resolved input values in input order.
    ///
    /// Fails with `InputResolution` naming the first unresolved input.
    pub fn input_values(&self) -> ColorWalletResult<Vec<u64>> {
        self.inputs
            .iter()
            .enumerate()
            .map(|(input_index, input)| {
                input.value.ok_or(ColorWalletError::InputResolution {
                    txhash: self.hash,
                    input_index,
                })
            })
            .collect()
    }

    /// Fill in every missing input value by looking up the spent output.
    ///
    /// Coinbase inputs resolve to zero. Already-resolved inputs are left as-is.
    pub async fn resolve_input_values<P>(&mut self, provider: &P) -> ColorWalletResult<()>
    where
        P: TransactionProvider + ?Sized,
    {
        if self.has_input_values() {
            return Ok(());
        }

        for input in self.inputs.iter_mut().filter(|i| i.value.is_none()) {
            if input.is_coinbase() {
                input.value = Some(0);
                continue;
            }
            let prev = provider.get_transaction(&input.outpoint.txhash).await?;
            let spent = prev
                .outputs
                .get(input.outpoint.outindex as usize)
                .ok_or_else(|| {
                    ColorWalletError::ResourceNotFound(format!(
                        "output {} does not exist",
                        input.outpoint
                    ))
                })?;
            input.value = Some(spent.value);
        }

        tracing::debug!("Resolved {} input values for {}", self.inputs.len(), self.hash);
        Ok(())
    }

    pub fn total_output_value(&self) -> u64 {
        self.outputs.iter().map(|o| o.value).sum()
    }

    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].is_coinbase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct MapProvider(HashMap<TxHash, Transaction>);

    #[async_trait]
    impl TransactionProvider for MapProvider {
        async fn get_transaction(&self, txhash: &TxHash) -> ColorWalletResult<Transaction> {
            self.0
                .get(txhash)
                .cloned()
                .ok_or_else(|| ColorWalletError::ResourceNotFound(txhash.to_hex()))
        }
    }

    fn hash(b: u8) -> TxHash {
        TxHash::new([b; 32])
    }

    #[test]
    fn test_input_values_unresolved() {
        let tx = Transaction::new(
            hash(2),
            vec![
                TxInput::with_value(OutPoint::new(hash(1), 0), 10),
                TxInput::new(OutPoint::new(hash(1), 1)),
            ],
            vec![TxOutput::new(5, vec![])],
        );
        assert!(!tx.has_input_values());
        match tx.input_values() {
            Err(ColorWalletError::InputResolution { input_index, .. }) => {
                assert_eq!(input_index, 1)
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resolve_input_values() {
        let prev = Transaction::new(
            hash(1),
            vec![TxInput::coinbase()],
            vec![TxOutput::new(70, vec![]), TxOutput::new(30, vec![])],
        );
        let provider = MapProvider(HashMap::from([(prev.hash, prev)]));

        let mut tx = Transaction::new(
            hash(2),
            vec![
                TxInput::new(OutPoint::new(hash(1), 1)),
                TxInput::new(OutPoint::new(hash(1), 0)),
            ],
            vec![TxOutput::new(100, vec![])],
        );
        tx.resolve_input_values(&provider).await.unwrap();
        assert_eq!(tx.input_values().unwrap(), vec![30, 70]);
    }

    #[tokio::test]
    async fn test_resolve_missing_output_fails() {
        let prev = Transaction::new(hash(1), vec![], vec![TxOutput::new(70, vec![])]);
        let provider = MapProvider(HashMap::from([(prev.hash, prev)]));
        let mut tx = Transaction::new(
            hash(2),
            vec![TxInput::new(OutPoint::new(hash(1), 4))],
            vec![],
        );
        assert!(tx.resolve_input_values(&provider).await.is_err());
        assert!(!tx.has_input_values());
    }

    #[tokio::test]
    async fn test_coinbase_resolves_to_zero() {
        let provider = MapProvider(HashMap::new());
        let mut tx = Transaction::new(
            hash(3),
            vec![TxInput::new(OutPoint::null())],
            vec![TxOutput::new(50, vec![])],
        );
        tx.resolve_input_values(&provider).await.unwrap();
        assert!(tx.is_coinbase());
        assert_eq!(tx.input_values().unwrap(), vec![0]);
    }
}
