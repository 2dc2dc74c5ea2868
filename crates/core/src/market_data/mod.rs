//! Market data module - price history models, cache, and fetch service.

mod market_data_model;
mod market_data_traits;
mod price_cache;
mod price_history_service;
mod provider_history_source;

pub use market_data_model::{PriceCacheKey, PriceHistory, PriceHistoryBatch, PricePoint};
pub use market_data_traits::{PriceCacheTrait, PriceHistoryProviderTrait};
pub use price_cache::InMemoryPriceCache;
pub use price_history_service::PriceHistoryService;
pub use provider_history_source::ProviderHistorySource;

// Re-export error types for convenience
pub use alphaboard_market_data::MarketDataError;
