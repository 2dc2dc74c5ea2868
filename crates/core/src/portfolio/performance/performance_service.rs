//! Performance analytics service.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use log::{debug, info, warn};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Instant;

use super::calendar_returns::calculate_calendar_returns;
use super::daily_returns::DailyReturnCalculator;
use super::performance_model::{
    ComprehensivePerformance, DailyReturnSeries, ReturnWindow, RollingReturnsMeta,
    RollingReturnsResponse, SummaryMetrics, METHOD_EQUAL_WEIGHT,
};
use super::performance_traits::PerformanceServiceTrait;
use super::risk_metrics::{
    annualized_volatility_pct, max_drawdown_pct, profitable_weeks_pct, sharpe_ratio,
    volatility_risk_score, win_rate_pct,
};
use super::rolling_returns::{aggregate_returns, compound_returns};
use super::trade_statistics::{
    best_trades, contribution_by_asset, median_holding_period_days, portfolio_breakdown,
    trade_results, worst_trades,
};
use crate::constants::{
    DECIMAL_PRECISION, HISTORY_PADDING_DAYS, MAX_LOOKBACK_CAP_DAYS, MONTH_WINDOW_MIN_LOOKBACK_DAYS,
};
use crate::errors::{CalculatorError, Result};
use crate::market_data::{PriceHistoryBatch, PriceHistoryService};
use crate::positions::{Position, PositionRepositoryTrait};
use crate::settings::PerformanceSettings;
use crate::utils::time_utils::{trading_days_between, valuation_date_today};

/// Tradable positions with the price histories they need.
struct PerformanceInputs {
    positions: Vec<Position>,
    batch: PriceHistoryBatch,
    earliest_entry: NaiveDate,
}

pub struct PerformanceService {
    repository: Arc<dyn PositionRepositoryTrait>,
    price_history: Arc<PriceHistoryService>,
    settings: PerformanceSettings,
    valuation_date: Option<NaiveDate>,
}

impl PerformanceService {
    pub fn new(
        repository: Arc<dyn PositionRepositoryTrait>,
        price_history: Arc<PriceHistoryService>,
        settings: PerformanceSettings,
    ) -> Self {
        Self {
            repository,
            price_history,
            settings,
            valuation_date: None,
        }
    }

    /// Pins "today" instead of reading the clock.
    pub fn with_valuation_date(mut self, date: NaiveDate) -> Self {
        self.valuation_date = Some(date);
        self
    }

    fn today(&self) -> NaiveDate {
        self.valuation_date.unwrap_or_else(valuation_date_today)
    }

    /// Loads open and closed positions and fetches histories for them and the
    /// benchmark through today. Without a lookback the fetch starts at the
    /// first entry. Returns `None` when the user has nothing to analyse.
    async fn load_inputs(
        &self,
        user_id: &str,
        lookback_days: Option<i64>,
    ) -> Result<Option<PerformanceInputs>> {
        let positions: Vec<Position> = self
            .repository
            .list_positions(user_id, None)?
            .into_iter()
            .filter(|p| p.is_tradable())
            .collect();

        let Some(earliest_entry) = positions.iter().filter_map(|p| p.entry()).map(|e| e.date).min()
        else {
            debug!("No open or closed recommendations for user {}", user_id);
            return Ok(None);
        };

        let today = self.today();
        let range_start = match lookback_days {
            Some(days) => self.range_start(earliest_entry, days),
            None => earliest_entry,
        };
        let start = range_start - Duration::days(HISTORY_PADDING_DAYS);

        let mut tickers: Vec<String> = positions.iter().map(|p| p.ticker.clone()).collect();
        tickers.push(self.settings.benchmark_ticker.clone());

        let mut batch = self.price_history.fetch_histories(&tickers, start, today).await;

        let benchmark = &self.settings.benchmark_ticker;
        if batch.history(benchmark).is_none() {
            warn!("Benchmark {} has no price history; benchmark returns will be zero", benchmark);
        }
        batch.missing_symbols.retain(|t| t != benchmark);
        for symbol in &batch.missing_symbols {
            warn!("{}", CalculatorError::MissingSymbol(symbol.clone()));
        }

        Ok(Some(PerformanceInputs {
            positions,
            batch,
            earliest_entry,
        }))
    }

    /// Range start: the first entry, but never more than `lookback_days` ago.
    fn range_start(&self, earliest_entry: NaiveDate, lookback_days: i64) -> NaiveDate {
        let lookback_days = lookback_days.clamp(1, MAX_LOOKBACK_CAP_DAYS);
        earliest_entry.max(self.today() - Duration::days(lookback_days))
    }

    fn daily_series(&self, inputs: &PerformanceInputs, start: NaiveDate) -> DailyReturnSeries {
        let days = trading_days_between(start, self.today());
        let benchmark = inputs.batch.history(&self.settings.benchmark_ticker);
        let deadline = Instant::now() + self.settings.compute_budget();

        DailyReturnCalculator::new(&inputs.positions, &inputs.batch.histories, benchmark)
            .calculate(&days, Some(deadline))
    }

    fn summary_metrics(
        &self,
        positions: &[Position],
        series: &DailyReturnSeries,
    ) -> SummaryMetrics {
        let returns = series.returns();
        let total_return_pct = compound_returns(&returns) * Decimal::ONE_HUNDRED;
        let benchmark_return_pct =
            compound_returns(&series.benchmark_returns()) * Decimal::ONE_HUNDRED;

        SummaryMetrics {
            total_return_pct: total_return_pct.round_dp(DECIMAL_PRECISION),
            benchmark_return_pct: benchmark_return_pct.round_dp(DECIMAL_PRECISION),
            alpha_pct: (total_return_pct - benchmark_return_pct).round_dp(DECIMAL_PRECISION),
            sharpe_ratio: sharpe_ratio(&returns, self.settings.risk_free_rate)
                .round_dp(DECIMAL_PRECISION),
            max_drawdown_pct: max_drawdown_pct(&returns).round_dp(DECIMAL_PRECISION),
            volatility_pct: annualized_volatility_pct(&returns).round_dp(DECIMAL_PRECISION),
            win_rate: win_rate_pct(positions).round_dp(DECIMAL_PRECISION),
            avg_risk_score: volatility_risk_score(&returns).round_dp(DECIMAL_PRECISION),
            profitable_weeks_pct: profitable_weeks_pct(&series.points)
                .round_dp(DECIMAL_PRECISION),
            total_trades: positions.len(),
            median_holding_period_days: median_holding_period_days(positions),
        }
    }
}

#[async_trait]
impl PerformanceServiceTrait for PerformanceService {
    async fn compute_comprehensive_performance(
        &self,
        user_id: &str,
    ) -> Result<ComprehensivePerformance> {
        let Some(inputs) = self.load_inputs(user_id, None).await? else {
            return Ok(ComprehensivePerformance {
                summary_metrics: SummaryMetrics {
                    avg_risk_score: volatility_risk_score(&[]),
                    ..SummaryMetrics::default()
                },
                ..ComprehensivePerformance::default()
            });
        };

        let today = self.today();
        let start = self.range_start(inputs.earliest_entry, self.settings.lookback_cap());
        let series = self.daily_series(&inputs, start);
        let summary_metrics = self.summary_metrics(&inputs.positions, &series);

        let calendar = calculate_calendar_returns(
            &inputs.positions,
            &inputs.batch.histories,
            today,
            self.settings.calendar_start_year,
        );
        let trades = trade_results(&inputs.positions, today);

        info!(
            "Performance for user {}: {} trading days{}, total return {}%",
            user_id,
            series.points.len(),
            if series.truncated { " (truncated)" } else { "" },
            summary_metrics.total_return_pct.round_dp(2)
        );

        Ok(ComprehensivePerformance {
            summary_metrics,
            monthly_returns: calendar.monthly,
            yearly_returns: calendar.yearly,
            portfolio_breakdown: portfolio_breakdown(&inputs.positions),
            contributions: contribution_by_asset(&inputs.positions),
            best_trades: best_trades(&trades),
            worst_trades: worst_trades(&trades),
            missing_symbols: inputs.batch.missing_symbols,
        })
    }

    async fn compute_rolling_returns(
        &self,
        user_id: &str,
        window: ReturnWindow,
    ) -> Result<RollingReturnsResponse> {
        let lookback_days = match window {
            ReturnWindow::Month => self
                .settings
                .lookback_cap()
                .max(MONTH_WINDOW_MIN_LOOKBACK_DAYS),
            ReturnWindow::Day | ReturnWindow::Week => self.settings.lookback_cap(),
        };

        let empty_meta = RollingReturnsMeta {
            window_days: window.window_days(),
            start_date: None,
            end_date: None,
            method_used: METHOD_EQUAL_WEIGHT.to_string(),
            missing_symbols: Vec::new(),
        };

        let Some(inputs) = self.load_inputs(user_id, Some(lookback_days)).await? else {
            return Ok(RollingReturnsResponse {
                points: Vec::new(),
                cumulative: Vec::new(),
                meta: empty_meta,
            });
        };

        let start = self.range_start(inputs.earliest_entry, lookback_days);
        let series = self.daily_series(&inputs, start);
        let (mut points, mut cumulative) = aggregate_returns(&series.points, window);

        for point in &mut points {
            point.period_return =
                (point.period_return * Decimal::ONE_HUNDRED).round_dp(DECIMAL_PRECISION);
        }
        for point in &mut cumulative {
            point.cumulative_return =
                (point.cumulative_return * Decimal::ONE_HUNDRED).round_dp(DECIMAL_PRECISION);
        }

        debug!(
            "Rolling {} returns for user {}: {} points from {} daily observations",
            window,
            user_id,
            points.len(),
            series.points.len()
        );

        Ok(RollingReturnsResponse {
            points,
            cumulative,
            meta: RollingReturnsMeta {
                start_date: series.points.first().map(|p| p.date),
                end_date: series.points.last().map(|p| p.date),
                missing_symbols: inputs.batch.missing_symbols,
                ..empty_meta
            },
        })
    }
}
