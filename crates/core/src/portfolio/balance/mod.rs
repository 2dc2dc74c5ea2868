//! Paper-trading cash balance.

mod balance_calculator;
mod balance_service;

pub use balance_calculator::compute_balance;
pub use balance_service::*;
