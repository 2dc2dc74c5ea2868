//! Performance module - daily return series, rolling and calendar returns,
//! risk metrics, and the service exposing them.

pub mod calendar_returns;
pub mod daily_returns;
mod performance_model;
mod performance_service;
mod performance_traits;
pub mod risk_metrics;
pub mod rolling_returns;
pub mod trade_statistics;

pub use daily_returns::DailyReturnCalculator;
pub use performance_model::*;
pub use performance_service::*;
pub use performance_traits::*;
