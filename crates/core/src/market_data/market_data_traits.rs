use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::market_data_model::{PriceCacheKey, PriceHistory, PricePoint};
use crate::constants::DEFAULT_FETCH_CONCURRENCY;
use crate::errors::Result;

/// Source of daily closes.
///
/// Implementations may be remote; callers bound each call with a timeout.
#[async_trait]
pub trait PriceHistoryProviderTrait: Send + Sync {
    /// Daily closes in `[start, end]`, ascending. An unknown ticker yields an
    /// empty vector rather than an error.
    async fn get_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>>;

    async fn get_latest_price(&self, ticker: &str) -> Result<Option<Decimal>>;

    /// Most history requests a batch may keep in flight.
    fn max_concurrency(&self) -> usize {
        DEFAULT_FETCH_CONCURRENCY
    }
}

/// Shared cache for fetched price histories.
pub trait PriceCacheTrait: Send + Sync {
    fn get(&self, key: &PriceCacheKey) -> Option<PriceHistory>;

    fn set(&self, key: PriceCacheKey, history: PriceHistory);

    /// Drops expired entries and returns how many were removed.
    fn evict_expired(&self) -> usize;
}
