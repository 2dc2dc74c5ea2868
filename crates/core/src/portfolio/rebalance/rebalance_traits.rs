use async_trait::async_trait;
use rust_decimal::Decimal;

use super::rebalance_model::{RebalanceOutcome, WeightAssignment, WeightValidation};
use crate::errors::Result;

/// Weight management for a user's OPEN recommendations.
#[async_trait]
pub trait RebalanceServiceTrait: Send + Sync {
    /// Sets one position's weight and rescales the others proportionally.
    async fn rebalance_weights(
        &self,
        user_id: &str,
        target_id: &str,
        new_weight: Decimal,
    ) -> Result<RebalanceOutcome>;

    /// Checks whether adding `proposed_weight` keeps the OPEN total at 100%.
    fn validate_new_weight(&self, user_id: &str, proposed_weight: Decimal)
        -> Result<WeightValidation>;

    /// Normalizes a caller-supplied assignment to 100% and re-sizes.
    async fn apply_weights(
        &self,
        user_id: &str,
        weights: WeightAssignment,
    ) -> Result<RebalanceOutcome>;

    /// Re-sizes every OPEN position from its normalized weight, or equal
    /// weights when none are set.
    async fn equalize_weights(&self, user_id: &str) -> Result<RebalanceOutcome>;
}
