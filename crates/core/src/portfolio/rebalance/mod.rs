//! Weight rebalancing for OPEN recommendations.

mod rebalance_model;
mod rebalance_service;
mod rebalance_traits;
pub mod weight_rebalancer;

pub use rebalance_model::*;
pub use rebalance_service::*;
pub use rebalance_traits::*;
