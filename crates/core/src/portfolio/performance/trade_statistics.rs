use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::HashMap;

use super::performance_model::{AllocationSlice, AssetContribution, TradeResult};
use crate::constants::{DECIMAL_PRECISION, TRADE_TABLE_SIZE};
use crate::portfolio::rebalance::weight_rebalancer::equal_weights;
use crate::positions::{Position, PositionLifecycle};

/// One result per open or closed position whose return can be computed.
pub fn trade_results(positions: &[Position], as_of: NaiveDate) -> Vec<TradeResult> {
    positions
        .iter()
        .filter_map(|p| {
            let entry = p.entry()?;
            let trade_return = p.trade_return()?;
            let reference_price = match &p.lifecycle {
                PositionLifecycle::Closed { exit: Some(exit), .. } => exit.price,
                _ => p.current_price?,
            };
            Some(TradeResult {
                position_id: p.id.clone(),
                ticker: p.ticker.clone(),
                action: p.action,
                status: p.status(),
                entry_date: entry.date,
                exit_date: p.exit().map(|e| e.date),
                entry_price: entry.price,
                reference_price,
                return_pct: (trade_return * Decimal::ONE_HUNDRED).round_dp(DECIMAL_PRECISION),
                holding_days: p.holding_period_days(as_of).unwrap_or(0),
            })
        })
        .collect()
}

fn by_return_desc(a: &TradeResult, b: &TradeResult) -> Ordering {
    b.return_pct
        .cmp(&a.return_pct)
        .then_with(|| a.position_id.cmp(&b.position_id))
}

pub fn best_trades(results: &[TradeResult]) -> Vec<TradeResult> {
    let mut sorted = results.to_vec();
    sorted.sort_by(by_return_desc);
    sorted.truncate(TRADE_TABLE_SIZE);
    sorted
}

pub fn worst_trades(results: &[TradeResult]) -> Vec<TradeResult> {
    let mut sorted = results.to_vec();
    sorted.sort_by(|a, b| by_return_desc(b, a));
    sorted.truncate(TRADE_TABLE_SIZE);
    sorted
}

/// Unrealized P&L of an open position: `(mark − entry) × units`, signed by
/// the action. Zero for anything not open.
pub fn unrealized_pnl(position: &Position) -> Decimal {
    if !position.is_open() {
        return Decimal::ZERO;
    }
    match (position.entry(), position.mark_price()) {
        (Some(entry), Some(mark)) => position
            .action
            .signed_return((mark - entry.price) * position.position_size),
        _ => Decimal::ZERO,
    }
}

#[derive(Default)]
struct TickerTotals {
    value: Decimal,
    pnl: Decimal,
    count: usize,
}

/// Current value and unrealized P&L of OPEN positions grouped by ticker,
/// largest first.
pub fn portfolio_breakdown(positions: &[Position]) -> Vec<AllocationSlice> {
    let mut by_ticker: HashMap<&str, TickerTotals> = HashMap::new();
    for position in positions.iter().filter(|p| p.is_open()) {
        let slot = by_ticker.entry(position.ticker.as_str()).or_default();
        slot.value += position.current_value();
        slot.pnl += unrealized_pnl(position);
        slot.count += 1;
    }

    let total: Decimal = by_ticker.values().map(|t| t.value).sum();

    let mut slices: Vec<AllocationSlice> = by_ticker
        .into_iter()
        .map(|(ticker, totals)| AllocationSlice {
            ticker: ticker.to_string(),
            current_value: totals.value,
            allocation_pct: if total > Decimal::ZERO {
                (totals.value / total * Decimal::ONE_HUNDRED).round_dp(DECIMAL_PRECISION)
            } else {
                Decimal::ZERO
            },
            position_count: totals.count,
            unrealized_pnl: totals.pnl.round_dp(DECIMAL_PRECISION),
        })
        .collect();

    slices.sort_by(|a, b| {
        b.current_value
            .cmp(&a.current_value)
            .then_with(|| a.ticker.cmp(&b.ticker))
    });
    slices
}

/// Contribution of each ticker to the portfolio return: `weight × return`.
///
/// Weights are the stored `weight_pct` of OPEN positions, or equal weights
/// when none is set. A ticker's return is the mean trade return of its open
/// positions, 0 when no current price is known. Sorted by absolute
/// contribution, largest first.
pub fn contribution_by_asset(positions: &[Position]) -> Vec<AssetContribution> {
    let open: Vec<&Position> = positions.iter().filter(|p| p.is_open()).collect();
    let any_weight = open.iter().any(|p| p.weight_pct.is_some());
    let fallback = equal_weights(open.iter().map(|p| p.id.as_str()));

    let mut by_ticker: HashMap<&str, (Decimal, Vec<Decimal>)> = HashMap::new();
    for position in &open {
        let weight = if any_weight {
            position.weight_pct.unwrap_or(Decimal::ZERO)
        } else {
            fallback.get(&position.id).copied().unwrap_or(Decimal::ZERO)
        };
        let slot = by_ticker
            .entry(position.ticker.as_str())
            .or_insert((Decimal::ZERO, Vec::new()));
        slot.0 += weight;
        if let Some(r) = position.trade_return() {
            slot.1.push(r);
        }
    }

    let mut contributions: Vec<AssetContribution> = by_ticker
        .into_iter()
        .map(|(ticker, (weight, returns))| {
            let return_pct = if returns.is_empty() {
                Decimal::ZERO
            } else {
                returns.iter().sum::<Decimal>() / Decimal::from(returns.len())
                    * Decimal::ONE_HUNDRED
            };
            AssetContribution {
                ticker: ticker.to_string(),
                weight_pct: weight.round_dp(DECIMAL_PRECISION),
                return_pct: return_pct.round_dp(DECIMAL_PRECISION),
                contribution_pct: (weight / Decimal::ONE_HUNDRED * return_pct)
                    .round_dp(DECIMAL_PRECISION),
            }
        })
        .collect();

    contributions.sort_by(|a, b| {
        b.contribution_pct
            .abs()
            .cmp(&a.contribution_pct.abs())
            .then_with(|| a.ticker.cmp(&b.ticker))
    });
    contributions
}

/// Median holding period of positions that have exited, in days.
pub fn median_holding_period_days(positions: &[Position]) -> Decimal {
    let mut days: Vec<i64> = positions
        .iter()
        .filter_map(|p| {
            let entry = p.entry()?;
            let exit = p.exit()?;
            Some((exit.date - entry.date).num_days().max(0))
        })
        .collect();
    if days.is_empty() {
        return Decimal::ZERO;
    }
    days.sort_unstable();
    let mid = days.len() / 2;
    if days.len() % 2 == 0 {
        Decimal::from(days[mid - 1] + days[mid]) / Decimal::TWO
    } else {
        Decimal::from(days[mid])
    }
}
