use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use log::{debug, warn};
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use super::market_data_model::{PriceCacheKey, PriceHistory, PriceHistoryBatch};
use super::market_data_traits::{PriceCacheTrait, PriceHistoryProviderTrait};
use crate::errors::{CalculatorError, Error};

/// Fetches price histories for a set of tickers through the cache.
///
/// Tickers are fetched concurrently, at most `max_concurrency` of the
/// provider at a time, each under its own timeout. A ticker that
/// fails, times out, or returns nothing gets an empty history and is listed
/// in `missing_symbols`; the batch itself never fails.
pub struct PriceHistoryService {
    provider: Arc<dyn PriceHistoryProviderTrait>,
    cache: Arc<dyn PriceCacheTrait>,
    request_timeout: Duration,
}

impl PriceHistoryService {
    pub fn new(
        provider: Arc<dyn PriceHistoryProviderTrait>,
        cache: Arc<dyn PriceCacheTrait>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            cache,
            request_timeout,
        }
    }

    pub async fn fetch_histories(
        &self,
        tickers: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> PriceHistoryBatch {
        let unique: BTreeSet<&String> = tickers.iter().filter(|t| !t.is_empty()).collect();
        let mut histories: HashMap<String, PriceHistory> = HashMap::with_capacity(unique.len());
        let mut to_fetch: Vec<&String> = Vec::new();

        for ticker in unique {
            let key = PriceCacheKey::new(ticker.as_str(), start, end);
            match self.cache.get(&key) {
                Some(history) => {
                    histories.insert(ticker.clone(), history);
                }
                None => to_fetch.push(ticker),
            }
        }

        debug!(
            "Price history batch {}..{}: {} cached, {} to fetch",
            start,
            end,
            histories.len(),
            to_fetch.len()
        );

        let fetched: Vec<(String, Result<PriceHistory, Error>)> = stream::iter(to_fetch.into_iter().cloned())
            .map(|ticker: String| async move {
                let result = self.fetch_one(&ticker, start, end).await;
                (ticker, result)
            })
            .buffer_unordered(self.provider.max_concurrency().max(1))
            .collect()
            .await;

        for (ticker, result) in fetched {
            match result {
                Ok(history) => {
                    if !history.is_empty() {
                        self.cache.set(
                            PriceCacheKey::new(ticker.as_str(), start, end),
                            history.clone(),
                        );
                    }
                    histories.insert(ticker, history);
                }
                Err(e) => {
                    warn!("Price history unavailable for {}: {}", ticker, e);
                    histories.insert(ticker.clone(), PriceHistory::empty(ticker));
                }
            }
        }

        let mut missing_symbols: Vec<String> = histories
            .iter()
            .filter(|(_, h)| h.is_empty())
            .map(|(t, _)| t.clone())
            .collect();
        missing_symbols.sort();

        PriceHistoryBatch {
            histories,
            missing_symbols,
        }
    }

    /// Latest price for one ticker, `None` on any failure.
    pub async fn latest_price(&self, ticker: &str) -> Option<Decimal> {
        match tokio::time::timeout(self.request_timeout, self.provider.get_latest_price(ticker))
            .await
        {
            Ok(Ok(price)) => price,
            Ok(Err(e)) => {
                warn!("Latest price unavailable for {}: {}", ticker, e);
                None
            }
            Err(_) => {
                warn!("{}", CalculatorError::UpstreamTimeout(ticker.to_string()));
                None
            }
        }
    }

    async fn fetch_one(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceHistory, Error> {
        let points = tokio::time::timeout(
            self.request_timeout,
            self.provider.get_history(ticker, start, end),
        )
        .await
        .map_err(|_| CalculatorError::UpstreamTimeout(ticker.to_string()))??;
        Ok(PriceHistory::new(ticker, points))
    }
}
