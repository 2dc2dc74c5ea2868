use crate::errors::Result;
use crate::positions::positions_model::{
    NewPosition, PortfolioBalance, Position, PositionFieldsUpdate, PositionSizing, PositionStatus,
};
use async_trait::async_trait;

/// Trait for the recommendation store.
///
/// Reads are synchronous; writes go through the storage writer and are async.
#[async_trait]
pub trait PositionRepositoryTrait: Send + Sync {
    /// Positions of a user, optionally filtered by status.
    fn list_positions(&self, user_id: &str, status: Option<PositionStatus>)
        -> Result<Vec<Position>>;

    fn get_position(&self, position_id: &str) -> Result<Position>;

    async fn create_position(&self, new_position: NewPosition) -> Result<Position>;

    async fn update_position_fields(
        &self,
        position_id: &str,
        fields: PositionFieldsUpdate,
    ) -> Result<Position>;

    fn get_balance(&self, user_id: &str) -> Result<Option<PortfolioBalance>>;

    async fn upsert_balance(&self, balance: PortfolioBalance) -> Result<PortfolioBalance>;

    /// Writes every sizing and the balance atomically. Returns the number of
    /// position rows updated.
    async fn apply_rebalance(
        &self,
        user_id: &str,
        sizings: Vec<PositionSizing>,
        balance: PortfolioBalance,
    ) -> Result<usize>;
}
