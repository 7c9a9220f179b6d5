//! Transaction composition
//!
//! Colored and uncolored targets are funded from separate coin pools. Colored
//! change always goes back with the same color id, so a draft never moves
//! more color than it selected.

use crate::{
    colordef::{ColorDefinition, ColorKernel, ColorMap, ObColorDefinition, UncoloredDefinition},
    data_structures::{
        types::{ColorId, UNCOLORED_COLOR_ID},
        utxo::Utxo,
    },
    errors::{ColorWalletError, ColorWalletResult},
    transaction::tx_spec::{ColorTarget, ComposedTxSpec, OperationalTxSpec},
};

fn sum_targets(targets: &[ColorTarget]) -> ColorWalletResult<u64> {
    targets.iter().try_fold(0u64, |acc, target| {
        acc.checked_add(target.value).ok_or_else(|| ColorWalletError::InvalidArgument {
            argument: "targets".to_string(),
            value: target.value.to_string(),
            message: "total target value overflows".to_string(),
        })
    })
}

fn change_of(selected: u64, needed: u64) -> ColorWalletResult<u64> {
    selected.checked_sub(needed).ok_or_else(|| {
        ColorWalletError::InsufficientFunds(format!(
            "Selected {selected} but {needed} is required"
        ))
    })
}

/// Fund `targets` of `color_id` (plus `extra`) and append change when positive
async fn fund_bucket(
    spec: &dyn OperationalTxSpec,
    color_id: ColorId,
    targets: &mut Vec<ColorTarget>,
    extra: u64,
) -> ColorWalletResult<Vec<Utxo>> {
    let needed = sum_targets(targets)?
        .checked_add(extra)
        .ok_or_else(|| ColorWalletError::InvalidArgument {
            argument: "fee".to_string(),
            value: extra.to_string(),
            message: "fee overflows the target total".to_string(),
        })?;
    if needed == 0 {
        return Ok(Vec::new());
    }

    let (coins, selected) = spec.select_coins(color_id, needed).await?;
    let change = change_of(selected, needed)?;
    if change > 0 {
        let address = spec.change_address(color_id).await?;
        targets.push(ColorTarget::new(address, color_id, change));
    }
    tracing::debug!(
        "Selected {} coins worth {} for color {} (needed {}, change {})",
        coins.len(),
        selected,
        color_id,
        needed,
        change
    );
    Ok(coins)
}

impl ObColorDefinition {
    /// Compose a draft that pays this color's targets and uncolored targets
    ///
    /// A target of any other color is rejected before any coin is selected.
    pub async fn compose_tx_spec(
        &self,
        spec: &dyn OperationalTxSpec,
    ) -> ColorWalletResult<ComposedTxSpec> {
        let color_id = self.color_id();
        let mut colored_targets = Vec::new();
        let mut uncolored_targets = Vec::new();
        for target in spec.targets() {
            if target.color_id == color_id {
                colored_targets.push(target);
            } else if target.color_id == UNCOLORED_COLOR_ID {
                uncolored_targets.push(target);
            } else {
                return Err(ColorWalletError::Configuration(format!(
                    "target color {} cannot be composed by color {}",
                    target.color_id, color_id
                )));
            }
        }

        let mut inputs = fund_bucket(spec, color_id, &mut colored_targets, 0).await?;
        let fee = spec.required_fee();
        inputs.extend(fund_bucket(spec, UNCOLORED_COLOR_ID, &mut uncolored_targets, fee).await?);

        colored_targets.extend(uncolored_targets);
        Ok(ComposedTxSpec::new(inputs, &colored_targets))
    }
}

/// Compose a draft that only moves uncolored coins
pub async fn compose_uncolored_tx(
    spec: &dyn OperationalTxSpec,
) -> ColorWalletResult<ComposedTxSpec> {
    let mut targets = spec.targets();
    if let Some(target) = targets.iter().find(|t| t.color_id != UNCOLORED_COLOR_ID) {
        return Err(ColorWalletError::Configuration(format!(
            "uncolored transaction cannot pay color {}",
            target.color_id
        )));
    }

    let fee = spec.required_fee();
    let inputs = fund_bucket(spec, UNCOLORED_COLOR_ID, &mut targets, fee).await?;
    Ok(ComposedTxSpec::new(inputs, &targets))
}

impl ColorDefinition {
    /// Compose with the composer of this color's class
    pub async fn compose_tx_spec(
        &self,
        spec: &dyn OperationalTxSpec,
    ) -> ColorWalletResult<ComposedTxSpec> {
        match self {
            Self::Uncolored(_) => compose_uncolored_tx(spec).await,
            Self::OrderBased(def) => def.compose_tx_spec(spec).await,
        }
    }
}

/// The definition whose composer can handle every target of `spec`.
///
/// Uncolored targets go to the uncolored composer. Targets of one color,
/// alone or mixed with uncolored targets, go to that color's definition.
/// Targets spanning several colors have no composer.
pub fn tx_composer(
    color_map: &ColorMap,
    spec: &dyn OperationalTxSpec,
) -> ColorWalletResult<ColorDefinition> {
    if spec.is_uncolored() {
        return Ok(ColorDefinition::Uncolored(UncoloredDefinition));
    }

    let colored: Vec<ColorId> = spec
        .target_color_ids()
        .into_iter()
        .filter(|id| *id != UNCOLORED_COLOR_ID)
        .collect();
    match colored.as_slice() {
        [] => Err(ColorWalletError::InvalidArgument {
            argument: "targets".to_string(),
            value: String::new(),
            message: "transaction has no targets".to_string(),
        }),
        [color_id] => color_map.color_definition(*color_id),
        _ => Err(ColorWalletError::Configuration(format!(
            "no composer for targets of colors {colored:?}"
        ))),
    }
}

/// Compose `spec` with the composer [`tx_composer`] selects
pub async fn compose_operational_tx(
    color_map: &ColorMap,
    spec: &dyn OperationalTxSpec,
) -> ColorWalletResult<ComposedTxSpec> {
    let def = tx_composer(color_map, spec)?;
    tracing::debug!(
        "Composing {} targets with the composer of color {}",
        spec.targets().len(),
        def.color_id()
    );
    def.compose_tx_spec(spec).await
}
