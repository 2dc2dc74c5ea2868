pub mod balance;
pub mod performance;
pub mod rebalance;
pub mod timeline;

pub use balance::*;
pub use performance::*;
pub use rebalance::*;
