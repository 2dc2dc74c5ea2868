use async_trait::async_trait;
use log::{debug, info};
use std::sync::Arc;

use super::balance_calculator::compute_balance;
use crate::errors::Result;
use crate::positions::{PortfolioBalance, PositionRepositoryTrait, PositionStatus};
use crate::settings::PerformanceSettings;

#[async_trait]
pub trait BalanceServiceTrait: Send + Sync {
    /// The stored balance, creating it with the configured initial balance
    /// when the user has none.
    async fn get_or_init_balance(&self, user_id: &str) -> Result<PortfolioBalance>;

    /// Recomputes the balance from current OPEN positions and stores it.
    async fn refresh_balance(&self, user_id: &str) -> Result<PortfolioBalance>;
}

pub struct BalanceService {
    repository: Arc<dyn PositionRepositoryTrait>,
    settings: PerformanceSettings,
}

impl BalanceService {
    pub fn new(repository: Arc<dyn PositionRepositoryTrait>, settings: PerformanceSettings) -> Self {
        Self {
            repository,
            settings,
        }
    }
}

#[async_trait]
impl BalanceServiceTrait for BalanceService {
    async fn get_or_init_balance(&self, user_id: &str) -> Result<PortfolioBalance> {
        if let Some(balance) = self.repository.get_balance(user_id)? {
            return Ok(balance);
        }
        info!(
            "Initializing portfolio balance for user {} with {}",
            user_id, self.settings.initial_balance
        );
        self.repository
            .upsert_balance(PortfolioBalance::new(user_id, self.settings.initial_balance))
            .await
    }

    async fn refresh_balance(&self, user_id: &str) -> Result<PortfolioBalance> {
        let initial_balance = match self.repository.get_balance(user_id)? {
            Some(existing) => existing.initial_balance,
            None => self.settings.initial_balance,
        };
        let open = self
            .repository
            .list_positions(user_id, Some(PositionStatus::Open))?;
        let balance = compute_balance(user_id, initial_balance, &open);
        debug!(
            "Refreshed balance for user {}: invested {}, cash {}, current {}",
            user_id, balance.total_invested, balance.available_cash, balance.current_balance
        );
        self.repository.upsert_balance(balance).await
    }
}
