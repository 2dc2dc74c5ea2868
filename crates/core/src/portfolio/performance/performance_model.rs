use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ValidationError;
use crate::positions::{PositionAction, PositionStatus};
use crate::Error;

/// Portfolio and benchmark movement for one trading day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReturnPoint {
    pub date: NaiveDate,
    /// Equal-weight mean of active position returns (fractional)
    pub daily_return: Decimal,
    pub portfolio_value: Decimal,
    pub benchmark_return: Decimal,
    pub benchmark_value: Decimal,
    pub active_count: usize,
}

/// Output of the daily return calculator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyReturnSeries {
    pub points: Vec<DailyReturnPoint>,
    /// Set when the wall-clock budget stopped the loop early.
    pub truncated: bool,
}

impl DailyReturnSeries {
    pub fn returns(&self) -> Vec<Decimal> {
        self.points.iter().map(|p| p.daily_return).collect()
    }

    pub fn benchmark_returns(&self) -> Vec<Decimal> {
        self.points.iter().map(|p| p.benchmark_return).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollingReturnPoint {
    pub date: NaiveDate,
    #[serde(rename = "return")]
    pub period_return: Decimal,
    pub active_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CumulativeReturnPoint {
    pub date: NaiveDate,
    #[serde(rename = "return")]
    pub cumulative_return: Decimal,
    pub active_count: usize,
}

/// Rolling window granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReturnWindow {
    Day,
    Week,
    Month,
}

impl ReturnWindow {
    /// Number of trading days compounded per rolling value.
    pub fn window_days(&self) -> usize {
        match self {
            ReturnWindow::Day => 1,
            ReturnWindow::Week => 7,
            ReturnWindow::Month => 30,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnWindow::Day => "DAY",
            ReturnWindow::Week => "WEEK",
            ReturnWindow::Month => "MONTH",
        }
    }
}

impl fmt::Display for ReturnWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReturnWindow {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DAY" | "1D" => Ok(ReturnWindow::Day),
            "WEEK" | "1W" => Ok(ReturnWindow::Week),
            "MONTH" | "1M" => Ok(ReturnWindow::Month),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Unknown return window '{}'",
                other
            )))),
        }
    }
}

pub const METHOD_EQUAL_WEIGHT: &str = "equal_weight";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollingReturnsMeta {
    pub window_days: usize,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub method_used: String,
    pub missing_symbols: Vec<String>,
}

/// Rolling and cumulative returns, both in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollingReturnsResponse {
    pub points: Vec<RollingReturnPoint>,
    pub cumulative: Vec<CumulativeReturnPoint>,
    pub meta: RollingReturnsMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReturn {
    pub year: i32,
    pub month: u32,
    pub start_value: Decimal,
    pub end_value: Decimal,
    pub return_pct: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyReturn {
    pub year: i32,
    pub return_pct: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarReturns {
    pub monthly: Vec<MonthlyReturn>,
    pub yearly: Vec<YearlyReturn>,
}

/// Realized or marked result of one recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeResult {
    pub position_id: String,
    pub ticker: String,
    pub action: PositionAction,
    pub status: PositionStatus,
    pub entry_date: NaiveDate,
    pub exit_date: Option<NaiveDate>,
    pub entry_price: Decimal,
    /// Exit price for closed positions, current price otherwise
    pub reference_price: Decimal,
    pub return_pct: Decimal,
    pub holding_days: i64,
}

/// Share of current portfolio value held in one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationSlice {
    pub ticker: String,
    pub current_value: Decimal,
    pub allocation_pct: Decimal,
    pub position_count: usize,
    /// Signed `(mark − entry) × units` summed over the ticker's positions
    pub unrealized_pnl: Decimal,
}

/// Share of the portfolio return attributable to one ticker, in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetContribution {
    pub ticker: String,
    pub weight_pct: Decimal,
    pub return_pct: Decimal,
    pub contribution_pct: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryMetrics {
    pub total_return_pct: Decimal,
    pub benchmark_return_pct: Decimal,
    pub alpha_pct: Decimal,
    pub sharpe_ratio: Decimal,
    pub max_drawdown_pct: Decimal,
    pub volatility_pct: Decimal,
    pub win_rate: Decimal,
    pub avg_risk_score: Decimal,
    pub profitable_weeks_pct: Decimal,
    pub total_trades: usize,
    pub median_holding_period_days: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComprehensivePerformance {
    pub summary_metrics: SummaryMetrics,
    pub monthly_returns: Vec<MonthlyReturn>,
    pub yearly_returns: Vec<YearlyReturn>,
    pub portfolio_breakdown: Vec<AllocationSlice>,
    pub contributions: Vec<AssetContribution>,
    pub best_trades: Vec<TradeResult>,
    pub worst_trades: Vec<TradeResult>,
    pub missing_symbols: Vec<String>,
}
