//! Price history domain models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One daily close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: Decimal,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: Decimal) -> Self {
        Self { date, close }
    }
}

/// Daily closes for one ticker, sorted by date with at most one point per day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceHistory {
    ticker: String,
    points: Vec<PricePoint>,
}

impl PriceHistory {
    /// Sorts the points and keeps the last one seen for a duplicated date.
    /// Non-positive closes are dropped.
    pub fn new(ticker: impl Into<String>, mut points: Vec<PricePoint>) -> Self {
        points.retain(|p| p.close > Decimal::ZERO);
        points.sort_by_key(|p| p.date);
        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => deduped.push(point),
            }
        }
        Self {
            ticker: ticker.into(),
            points: deduped,
        }
    }

    pub fn empty(ticker: impl Into<String>) -> Self {
        Self::new(ticker, Vec::new())
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Close recorded exactly on `date`.
    pub fn close_on(&self, date: NaiveDate) -> Option<Decimal> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|idx| self.points[idx].close)
    }

    /// Most recent close on or before `date` (last observation carried forward).
    pub fn close_at_or_before(&self, date: NaiveDate) -> Option<Decimal> {
        let idx = self.points.partition_point(|p| p.date <= date);
        if idx == 0 {
            None
        } else {
            Some(self.points[idx - 1].close)
        }
    }
}

/// Cache key for one history request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PriceCacheKey {
    pub ticker: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PriceCacheKey {
    pub fn new(ticker: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            ticker: ticker.into(),
            start,
            end,
        }
    }
}

/// Result of fetching histories for a set of tickers.
#[derive(Debug, Clone, Default)]
pub struct PriceHistoryBatch {
    /// Every requested ticker has an entry; failed tickers get an empty history.
    pub histories: HashMap<String, PriceHistory>,
    /// Requested tickers that produced no prices, sorted.
    pub missing_symbols: Vec<String>,
}

impl PriceHistoryBatch {
    pub fn history(&self, ticker: &str) -> Option<&PriceHistory> {
        self.histories.get(ticker).filter(|h| !h.is_empty())
    }
}
