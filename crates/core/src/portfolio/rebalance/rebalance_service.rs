//! Rebalancing service: weight updates, sizing and balance write-back.

use async_trait::async_trait;
use dashmap::DashMap;
use log::{debug, info};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::rebalance_model::{RebalanceOutcome, WeightAssignment, WeightValidation};
use super::rebalance_traits::RebalanceServiceTrait;
use super::weight_rebalancer::{
    equal_weights, normalize_weights, rebalance, size_position, validate_weight_total,
};
use crate::constants::DECIMAL_PRECISION;
use crate::errors::{Result, ValidationError};
use crate::portfolio::balance::compute_balance;
use crate::positions::{
    validate_weight_range, Position, PositionFieldsUpdate, PositionRepositoryTrait,
    PositionSizing, PositionStatus,
};
use crate::settings::PerformanceSettings;

pub struct RebalanceService {
    repository: Arc<dyn PositionRepositoryTrait>,
    settings: PerformanceSettings,
    user_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl RebalanceService {
    pub fn new(repository: Arc<dyn PositionRepositoryTrait>, settings: PerformanceSettings) -> Self {
        Self {
            repository,
            settings,
            user_locks: DashMap::new(),
        }
    }

    fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        self.user_locks
            .entry(user_id.to_string())
            .or_default()
            .clone()
    }

    fn open_positions(&self, user_id: &str) -> Result<Vec<Position>> {
        self.repository
            .list_positions(user_id, Some(PositionStatus::Open))
    }

    /// Stored weights of the OPEN positions, missing ones as zero. Equal
    /// weights when nothing is set.
    fn current_assignment(open: &[Position]) -> WeightAssignment {
        if open.iter().all(|p| p.weight_pct.is_none()) {
            return equal_weights(open.iter().map(|p| p.id.clone()));
        }
        open.iter()
            .map(|p| (p.id.clone(), p.weight_pct.unwrap_or(Decimal::ZERO)))
            .collect()
    }

    fn initial_balance(&self, user_id: &str) -> Result<Decimal> {
        Ok(self
            .repository
            .get_balance(user_id)?
            .map(|b| b.initial_balance)
            .unwrap_or(self.settings.initial_balance))
    }

    /// Sizes every OPEN position from `weights` and writes sizes plus the
    /// recomputed balance in one store call. Positions absent from `weights`
    /// are zeroed.
    async fn write_assignment(
        &self,
        user_id: &str,
        mut open: Vec<Position>,
        weights: WeightAssignment,
    ) -> Result<RebalanceOutcome> {
        let initial_balance = self.initial_balance(user_id)?;
        let book_value: Decimal = open.iter().map(|p| p.current_value()).sum();
        let capital = if book_value > Decimal::ZERO {
            book_value
        } else {
            initial_balance
        };

        let mut sizings = Vec::with_capacity(open.len());
        for position in &mut open {
            let weight = weights.get(&position.id).copied().unwrap_or(Decimal::ZERO);
            let entry_price = position.entry().map(|e| e.price).unwrap_or(Decimal::ZERO);
            let (invested, size) = size_position(weight, capital, entry_price);
            let sizing = PositionSizing {
                position_id: position.id.clone(),
                weight_pct: weight.round_dp(DECIMAL_PRECISION),
                invested_amount: invested.round_dp(DECIMAL_PRECISION),
                position_size: size.round_dp(DECIMAL_PRECISION),
            };
            PositionFieldsUpdate::from(&sizing).apply_to(position);
            sizings.push(sizing);
        }

        let balance = compute_balance(user_id, initial_balance, &open);
        let updated = self
            .repository
            .apply_rebalance(user_id, sizings.clone(), balance.clone())
            .await?;

        info!(
            "Rebalanced {} position(s) for user {} over capital {}",
            updated, user_id, capital
        );

        Ok(RebalanceOutcome {
            weights,
            positions: sizings,
            balance,
        })
    }
}

#[async_trait]
impl RebalanceServiceTrait for RebalanceService {
    async fn rebalance_weights(
        &self,
        user_id: &str,
        target_id: &str,
        new_weight: Decimal,
    ) -> Result<RebalanceOutcome> {
        validate_weight_range(new_weight)?;

        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let open = self.open_positions(user_id)?;
        if !open.iter().any(|p| p.id == target_id) {
            return Err(ValidationError::InvalidInput(format!(
                "Position {} is not an open position of user {}",
                target_id, user_id
            ))
            .into());
        }

        let current = Self::current_assignment(&open);
        let weights = rebalance(&current, target_id, new_weight);
        debug!(
            "Rebalance for user {}: {} -> {} at {}%",
            user_id,
            current.len(),
            weights.len(),
            new_weight
        );

        self.write_assignment(user_id, open, weights).await
    }

    fn validate_new_weight(
        &self,
        user_id: &str,
        proposed_weight: Decimal,
    ) -> Result<WeightValidation> {
        validate_weight_range(proposed_weight)?;

        let current_total: Decimal = self
            .open_positions(user_id)?
            .iter()
            .filter_map(|p| p.weight_pct)
            .sum();

        Ok(match validate_weight_total(current_total, proposed_weight) {
            Ok(()) => WeightValidation::valid(),
            Err(e) => WeightValidation::invalid(e.to_string()),
        })
    }

    async fn apply_weights(
        &self,
        user_id: &str,
        weights: WeightAssignment,
    ) -> Result<RebalanceOutcome> {
        for weight in weights.values() {
            validate_weight_range(*weight)?;
        }

        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let open = self.open_positions(user_id)?;
        if let Some(unknown) = weights.keys().find(|id| !open.iter().any(|p| &p.id == *id)) {
            return Err(ValidationError::InvalidInput(format!(
                "Position {} is not an open position of user {}",
                unknown, user_id
            ))
            .into());
        }
        if weights.values().all(|w| w.is_zero()) && !open.is_empty() {
            return Err(ValidationError::InvalidInput(
                "At least one weight must be greater than zero".to_string(),
            )
            .into());
        }

        let complete: WeightAssignment = open
            .iter()
            .map(|p| {
                let weight = weights.get(&p.id).copied().unwrap_or(Decimal::ZERO);
                (p.id.clone(), weight)
            })
            .collect();

        self.write_assignment(user_id, open, normalize_weights(&complete))
            .await
    }

    async fn equalize_weights(&self, user_id: &str) -> Result<RebalanceOutcome> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let open = self.open_positions(user_id)?;
        let current = Self::current_assignment(&open);
        let weights = if current.values().any(|w| *w > Decimal::ZERO) {
            normalize_weights(&current)
        } else {
            equal_weights(open.iter().map(|p| p.id.clone()))
        };

        self.write_assignment(user_id, open, weights).await
    }
}
