//! AlphaBoard Core - recommendation models, performance analytics and
//! weight rebalancing.
//!
//! This crate is database-agnostic. It defines the store and price provider
//! traits that the `storage-sqlite` and `market-data` crates implement.

pub mod constants;
pub mod errors;
pub mod market_data;
pub mod portfolio;
pub mod positions;
pub mod settings;
pub mod utils;

// Re-export the service-facing types
pub use portfolio::*;
pub use positions::*;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
