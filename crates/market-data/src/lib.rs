//! AlphaBoard Market Data Crate
//!
//! Provider-agnostic price fetching for the AlphaBoard performance engine.
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |  Performance     |  (alphaboard-core)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |    Provider      |  (Yahoo, ...)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |     Quote        |  (daily OHLCV)
//! +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`MarketDataProvider`] - Trait implemented by every price source
//! - [`Quote`] - Market data quote with OHLCV data
//! - [`MarketDataError`] - Error type for provider failures

pub mod errors;
pub mod models;
pub mod provider;

pub use errors::MarketDataError;
pub use models::Quote;
pub use provider::yahoo::YahooProvider;
pub use provider::{MarketDataProvider, ProviderCapabilities, RateLimit};
