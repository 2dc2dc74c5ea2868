//! Pure weight arithmetic for rebalancing.
//!
//! Weights are percentages keyed by position id. Every function that
//! produces a non-empty assignment with a positive total keeps the sum at 100.

use rust_decimal::Decimal;

use super::rebalance_model::WeightAssignment;
use crate::constants::{REMAINING_WEIGHT_EPSILON, WEIGHT_SUM_TOLERANCE};
use crate::errors::CalculatorError;

/// Moves `target_id` to `new_weight` and scales the other weights so their
/// relative proportions are preserved.
///
/// An assignment that does not contain `target_id` is returned unchanged.
/// A single-member set, or `new_weight >= 100`, collapses to `{target_id: 100}`.
/// When the target previously held (almost) everything, the freed weight is
/// split equally among the others.
pub fn rebalance(
    old_weights: &WeightAssignment,
    target_id: &str,
    new_weight: Decimal,
) -> WeightAssignment {
    let Some(&old_target) = old_weights.get(target_id) else {
        return old_weights.clone();
    };

    if old_weights.len() == 1 || new_weight >= Decimal::ONE_HUNDRED {
        return WeightAssignment::from([(target_id.to_string(), Decimal::ONE_HUNDRED)]);
    }

    let remaining = Decimal::ONE - old_target / Decimal::ONE_HUNDRED;
    let new_remaining = Decimal::ONE - new_weight / Decimal::ONE_HUNDRED;
    let others = old_weights.len() - 1;

    let mut updated = WeightAssignment::new();
    for (id, &weight) in old_weights {
        let value = if id == target_id {
            new_weight
        } else if remaining <= REMAINING_WEIGHT_EPSILON {
            new_remaining * Decimal::ONE_HUNDRED / Decimal::from(others)
        } else {
            weight * new_remaining / remaining
        };
        updated.insert(id.clone(), value);
    }

    normalize_weights(&updated)
}

/// Scales weights so they sum to 100. A zero or negative total is left as is.
pub fn normalize_weights(weights: &WeightAssignment) -> WeightAssignment {
    let total: Decimal = weights.values().sum();
    if total <= Decimal::ZERO {
        return weights.clone();
    }
    weights
        .iter()
        .map(|(id, w)| (id.clone(), w * Decimal::ONE_HUNDRED / total))
        .collect()
}

/// `100 / n` for each id.
pub fn equal_weights<I, S>(ids: I) -> WeightAssignment
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
    if ids.is_empty() {
        return WeightAssignment::new();
    }
    let share = Decimal::ONE_HUNDRED / Decimal::from(ids.len());
    ids.into_iter().map(|id| (id, share)).collect()
}

/// `(invested_amount, position_size)` for a weight of `capital`.
pub fn size_position(
    weight_pct: Decimal,
    capital: Decimal,
    entry_price: Decimal,
) -> (Decimal, Decimal) {
    let invested = weight_pct / Decimal::ONE_HUNDRED * capital;
    let size = if entry_price > Decimal::ZERO {
        invested / entry_price
    } else {
        Decimal::ZERO
    };
    (invested, size)
}

/// Fails unless `current_total + proposed` is within tolerance of 100.
pub fn validate_weight_total(
    current_total: Decimal,
    proposed: Decimal,
) -> std::result::Result<(), CalculatorError> {
    let total = current_total + proposed;
    if (total - Decimal::ONE_HUNDRED).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(CalculatorError::WeightSumInvalid { total });
    }
    Ok(())
}
