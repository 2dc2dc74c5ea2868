use alphaboard_market_data::{MarketDataError, MarketDataProvider};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveTime};
use log::debug;
use rust_decimal::Decimal;
use std::sync::Arc;

use super::market_data_model::PricePoint;
use super::market_data_traits::PriceHistoryProviderTrait;
use crate::errors::Result;

/// Exposes a market data provider (Yahoo, ...) as a daily close source.
pub struct ProviderHistorySource {
    provider: Arc<dyn MarketDataProvider>,
}

impl ProviderHistorySource {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl PriceHistoryProviderTrait for ProviderHistorySource {
    async fn get_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>> {
        if !self.provider.capabilities().supports_historical {
            debug!("{} does not serve history, skipping {}", self.provider.id(), ticker);
            return Ok(Vec::new());
        }

        let start_ts = start.and_time(NaiveTime::MIN).and_utc();
        // Exclusive upper bound so the close of `end` is included.
        let end_ts = (end + Duration::days(1)).and_time(NaiveTime::MIN).and_utc();

        match self
            .provider
            .get_historical_quotes(ticker, start_ts, end_ts)
            .await
        {
            Ok(quotes) => Ok(quotes
                .into_iter()
                .map(|q| PricePoint::new(q.date(), q.close))
                .filter(|p| p.date >= start && p.date <= end)
                .collect()),
            Err(e) if e.is_empty_result() => {
                debug!("{} returned no history for {}: {}", self.provider.id(), ticker, e);
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_latest_price(&self, ticker: &str) -> Result<Option<Decimal>> {
        if !self.provider.capabilities().supports_latest {
            return Ok(None);
        }
        match self.provider.get_latest_quote(ticker).await {
            Ok(quote) => Ok(Some(quote.close)),
            Err(MarketDataError::SymbolNotFound(_)) | Err(MarketDataError::NoDataForRange) => {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn max_concurrency(&self) -> usize {
        self.provider.rate_limit().max_concurrency.max(1)
    }
}
