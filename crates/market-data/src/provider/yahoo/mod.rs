//! Yahoo Finance market data provider.
//!
//! Used for listed equities (e.g. `INFY.NS`, `AAPL`) and indices (e.g. `^NSEI`).

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use num_traits::FromPrimitive;
use rust_decimal::Decimal;
use time::OffsetDateTime;
use tracing::{debug, warn};
use yahoo_finance_api as yahoo;

use crate::errors::MarketDataError;
use crate::models::Quote;
use crate::provider::{MarketDataProvider, ProviderCapabilities, RateLimit};

const PROVIDER_ID: &str = "YAHOO";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Yahoo Finance market data provider.
pub struct YahooProvider {
    connector: yahoo::YahooConnector,
    request_timeout: Duration,
}

impl YahooProvider {
    /// Create a new Yahoo Finance provider.
    pub fn new() -> Result<Self, MarketDataError> {
        let connector =
            yahoo::YahooConnector::new().map_err(|e| MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to initialize Yahoo connector: {}", e),
            })?;
        Ok(Self {
            connector,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    /// Overrides the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Convert chrono DateTime<Utc> to time::OffsetDateTime for the Yahoo API.
    fn chrono_to_offset_datetime(dt: DateTime<Utc>) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(dt.timestamp())
            .unwrap_or_else(|_| OffsetDateTime::now_utc())
    }

    fn map_yahoo_error(symbol: &str, err: yahoo::YahooError) -> MarketDataError {
        if matches!(err, yahoo::YahooError::NoQuotes | yahoo::YahooError::NoResult) {
            MarketDataError::SymbolNotFound(symbol.to_string())
        } else {
            MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: err.to_string(),
            }
        }
    }

    /// Convert a Yahoo quote to our Quote model.
    fn yahoo_quote_to_quote(yahoo_quote: yahoo::Quote) -> Result<Quote, MarketDataError> {
        let timestamp: DateTime<Utc> = Utc
            .timestamp_opt(yahoo_quote.timestamp as i64, 0)
            .single()
            .ok_or_else(|| MarketDataError::ValidationFailed {
                message: format!("Invalid timestamp: {}", yahoo_quote.timestamp),
            })?;

        let close = Decimal::from_f64_retain(yahoo_quote.close)
            .filter(|c| c.is_sign_positive() && !c.is_zero())
            .ok_or_else(|| MarketDataError::ValidationFailed {
                message: format!("Invalid close price {}", yahoo_quote.close),
            })?;

        Ok(Quote {
            timestamp,
            open: Decimal::from_f64_retain(yahoo_quote.open),
            high: Decimal::from_f64_retain(yahoo_quote.high),
            low: Decimal::from_f64_retain(yahoo_quote.low),
            close,
            volume: Decimal::from_u64(yahoo_quote.volume),
            source: PROVIDER_ID.to_string(),
        })
    }

    async fn with_timeout<F, T>(&self, fut: F) -> Result<T, MarketDataError>
    where
        F: std::future::Future<Output = Result<T, MarketDataError>>,
    {
        tokio::time::timeout(self.request_timeout, fut)
            .await
            .map_err(|_| MarketDataError::Timeout {
                provider: PROVIDER_ID.to_string(),
            })?
    }
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            supports_latest: true,
            supports_historical: true,
        }
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit { max_concurrency: 10 }
    }

    async fn get_latest_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        debug!("Fetching latest quote for {} from Yahoo", symbol);

        let response = self
            .with_timeout(async {
                self.connector
                    .get_latest_quotes(symbol, "1d")
                    .await
                    .map_err(|e| Self::map_yahoo_error(symbol, e))
            })
            .await?;

        let yahoo_quote = response.last_quote().map_err(|e| {
            warn!("No quotes returned for {}: {}", symbol, e);
            MarketDataError::SymbolNotFound(symbol.to_string())
        })?;

        Self::yahoo_quote_to_quote(yahoo_quote)
    }

    async fn get_historical_quotes(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Quote>, MarketDataError> {
        debug!(
            "Fetching historical quotes for {} from {} to {} from Yahoo",
            symbol,
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        );

        let start_time = Self::chrono_to_offset_datetime(start);
        let end_time = Self::chrono_to_offset_datetime(end);

        let response = self
            .with_timeout(async {
                self.connector
                    .get_quote_history(symbol, start_time, end_time)
                    .await
                    .map_err(|e| Self::map_yahoo_error(symbol, e))
            })
            .await?;

        match response.quotes() {
            Ok(yahoo_quotes) => {
                let mut quotes: Vec<Quote> = yahoo_quotes
                    .into_iter()
                    .filter_map(|q| match Self::yahoo_quote_to_quote(q) {
                        Ok(quote) => Some(quote),
                        Err(e) => {
                            warn!("Skipping quote for {} due to conversion error: {}", symbol, e);
                            None
                        }
                    })
                    .collect();

                if quotes.is_empty() {
                    return Err(MarketDataError::NoDataForRange);
                }

                quotes.sort_by_key(|q| q.timestamp);
                Ok(quotes)
            }
            Err(yahoo::YahooError::NoQuotes) => {
                warn!(
                    "No historical quotes returned for '{}' between {} and {}",
                    symbol,
                    start.format("%Y-%m-%d"),
                    end.format("%Y-%m-%d")
                );
                Err(MarketDataError::NoDataForRange)
            }
            Err(e) => Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chrono_to_offset_datetime_preserves_instant() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let odt = YahooProvider::chrono_to_offset_datetime(dt);
        assert_eq!(odt.unix_timestamp(), dt.timestamp());
    }

    #[test]
    fn test_no_quotes_maps_to_symbol_not_found() {
        let err = YahooProvider::map_yahoo_error("BAD.NS", yahoo::YahooError::NoQuotes);
        assert!(matches!(err, MarketDataError::SymbolNotFound(s) if s == "BAD.NS"));
    }

    #[tokio::test]
    async fn test_capabilities_and_rate_limit() {
        let provider = YahooProvider::new().unwrap();
        let caps = provider.capabilities();
        assert!(caps.supports_latest);
        assert!(caps.supports_historical);
        assert_eq!(provider.id(), "YAHOO");
        assert_eq!(provider.rate_limit().max_concurrency, 10);
    }
}
