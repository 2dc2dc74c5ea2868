//! Recommendations module - domain models and the store trait.

mod positions_model;
mod positions_traits;

#[cfg(test)]
pub(crate) mod test_support;

pub(crate) use positions_model::validate_weight_range;
pub use positions_model::{
    NewPosition, PortfolioBalance, Position, PositionAction, PositionFieldsUpdate,
    PositionLifecycle, PositionSizing, PositionStatus, TradeMark,
};
pub use positions_traits::PositionRepositoryTrait;
