use chrono::Datelike;
use log::debug;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

use super::performance_model::DailyReturnPoint;
use crate::constants::{
    NEUTRAL_RISK_SCORE, PROFITABLE_WEEKS_MIN_POINTS, RISK_SCORE_WINDOW,
    SQRT_TRADING_DAYS_APPROX, TRADING_DAYS_PER_YEAR,
};
use crate::errors::CalculatorError;
use crate::positions::Position;

fn annualization_factor() -> Decimal {
    Decimal::from(TRADING_DAYS_PER_YEAR)
        .sqrt()
        .unwrap_or(SQRT_TRADING_DAYS_APPROX)
}

fn mean(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    values.iter().sum::<Decimal>() / Decimal::from(values.len())
}

/// Sample standard deviation (n − 1). `None` with fewer than two values.
pub fn sample_std_dev(values: &[Decimal]) -> Option<Decimal> {
    if values.len() < 2 {
        return None;
    }
    let avg = mean(values);
    let sum_squared_diff: Decimal = values
        .iter()
        .map(|&v| {
            let diff = v - avg;
            diff * diff
        })
        .sum();
    let variance = sum_squared_diff / Decimal::from(values.len() - 1);
    if variance.is_sign_negative() {
        return Some(Decimal::ZERO);
    }
    Some(variance.sqrt().unwrap_or(Decimal::ZERO))
}

/// Annualized Sharpe ratio of daily returns against an annual risk-free rate.
pub fn sharpe_ratio(daily_returns: &[Decimal], annual_risk_free_rate: Decimal) -> Decimal {
    let daily_rf = annual_risk_free_rate / Decimal::from(TRADING_DAYS_PER_YEAR);
    let excess: Vec<Decimal> = daily_returns.iter().map(|r| r - daily_rf).collect();

    let std = match sample_std_dev(&excess) {
        Some(std) if !std.is_zero() => std,
        _ => {
            debug!(
                "{}",
                CalculatorError::InsufficientData {
                    metric: "sharpe_ratio",
                    observations: excess.len(),
                }
            );
            return Decimal::ZERO;
        }
    };

    mean(&excess) * Decimal::from(TRADING_DAYS_PER_YEAR) / (std * annualization_factor())
}

/// Largest peak-to-trough decline of a value curve, in percent.
pub fn max_drawdown_from_values(values: &[Decimal]) -> Decimal {
    if values.len() < 2 {
        return Decimal::ZERO;
    }
    let mut peak = values[0];
    let mut worst = Decimal::ZERO;
    for &value in values {
        peak = peak.max(value);
        if peak > Decimal::ZERO {
            worst = worst.min((value - peak) / peak);
        }
    }
    worst.abs() * Decimal::ONE_HUNDRED
}

/// Maximum drawdown of the growth curve `Π(1 + r)`, in percent.
pub fn max_drawdown_pct(daily_returns: &[Decimal]) -> Decimal {
    let mut growth = Decimal::ONE;
    let curve: Vec<Decimal> = daily_returns
        .iter()
        .map(|r| {
            growth *= Decimal::ONE + r;
            growth
        })
        .collect();
    max_drawdown_from_values(&curve)
}

/// `std(r) × √252 × 100`.
pub fn annualized_volatility_pct(daily_returns: &[Decimal]) -> Decimal {
    sample_std_dev(daily_returns)
        .map(|std| std * annualization_factor() * Decimal::ONE_HUNDRED)
        .unwrap_or(Decimal::ZERO)
}

/// Risk score in `[1, 10]` from the volatility of the most recent returns.
/// Neutral when there are fewer than two observations.
pub fn volatility_risk_score(daily_returns: &[Decimal]) -> Decimal {
    let recent = &daily_returns[daily_returns.len().saturating_sub(RISK_SCORE_WINDOW)..];
    match sample_std_dev(recent) {
        Some(std) => (std / dec!(0.1) * dec!(10)).clamp(Decimal::ONE, dec!(10)),
        None => NEUTRAL_RISK_SCORE,
    }
}

/// Percentage of open/closed positions with a positive directional return.
/// Positions without the needed price are not counted.
pub fn win_rate_pct(positions: &[Position]) -> Decimal {
    let returns: Vec<Decimal> = positions.iter().filter_map(|p| p.trade_return()).collect();
    if returns.is_empty() {
        return Decimal::ZERO;
    }
    let wins = returns.iter().filter(|r| **r > Decimal::ZERO).count();
    Decimal::from(wins) / Decimal::from(returns.len()) * Decimal::ONE_HUNDRED
}

/// Share of ISO weeks whose compounded return is positive, in percent.
pub fn profitable_weeks_pct(points: &[DailyReturnPoint]) -> Decimal {
    if points.len() < PROFITABLE_WEEKS_MIN_POINTS {
        return Decimal::ZERO;
    }
    let mut weeks: BTreeMap<(i32, u32), Decimal> = BTreeMap::new();
    for point in points {
        let iso = point.date.iso_week();
        let growth = weeks.entry((iso.year(), iso.week())).or_insert(Decimal::ONE);
        *growth *= Decimal::ONE + point.daily_return;
    }
    let positive = weeks.values().filter(|g| **g > Decimal::ONE).count();
    Decimal::from(positive) / Decimal::from(weeks.len()) * Decimal::ONE_HUNDRED
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::positions::test_support::*;
    use crate::positions::PositionAction;
    use chrono::NaiveDate;

    fn approx(actual: Decimal, expected: Decimal, tolerance: Decimal) {
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {} ± {}, got {}",
            expected,
            tolerance,
            actual
        );
    }

    #[test]
    fn test_sharpe_known_value() {
        // mean 0.01, sample std sqrt(0.0002) => sqrt(126)
        let sharpe = sharpe_ratio(&[dec!(0.02), dec!(0.00)], Decimal::ZERO);
        approx(sharpe, dec!(11.2250), dec!(0.001));
    }

    #[test]
    fn test_sharpe_degenerate_inputs() {
        assert_eq!(sharpe_ratio(&[dec!(0.01)], dec!(0.05)), Decimal::ZERO);
        assert_eq!(
            sharpe_ratio(&[dec!(0.01), dec!(0.01), dec!(0.01)], dec!(0.05)),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_drawdown_from_values() {
        let dd = max_drawdown_from_values(&[dec!(100), dec!(110), dec!(90), dec!(120)]);
        approx(dd, dec!(18.18), dec!(0.01));
    }

    #[test]
    fn test_drawdown_from_returns() {
        // 1.1 then 0.9 * 1.1 = 0.99 => (0.99 - 1.1) / 1.1 = -10%
        let dd = max_drawdown_pct(&[dec!(0.1), dec!(-0.1), dec!(0.05)]);
        approx(dd, dec!(10), dec!(0.0001));
        assert_eq!(max_drawdown_pct(&[dec!(-0.5)]), Decimal::ZERO);
    }

    #[test]
    fn test_volatility_requires_two_points() {
        assert_eq!(annualized_volatility_pct(&[dec!(0.01)]), Decimal::ZERO);
        let vol = annualized_volatility_pct(&[dec!(0.02), dec!(0.00)]);
        // sqrt(0.0002) * sqrt(252) * 100
        approx(vol, dec!(22.4499), dec!(0.001));
    }

    #[test]
    fn test_risk_score_bounds() {
        assert_eq!(volatility_risk_score(&[dec!(0.01)]), dec!(5));
        assert_eq!(volatility_risk_score(&[dec!(0.01), dec!(0.01)]), dec!(1));
        assert_eq!(volatility_risk_score(&[dec!(0.5), dec!(-0.5)]), dec!(10));
        // std of [0.02, 0] = 0.014142 => 1.4142
        approx(
            volatility_risk_score(&[dec!(0.02), dec!(0.00)]),
            dec!(1.4142),
            dec!(0.001),
        );
    }

    #[test]
    fn test_risk_score_uses_last_seven_returns() {
        let mut returns = vec![dec!(0.5), dec!(-0.5)];
        returns.extend(std::iter::repeat(dec!(0.001)).take(7));
        assert_eq!(volatility_risk_score(&returns), dec!(1));
    }

    #[test]
    fn test_win_rate_counts_only_priced_positions() {
        let mut winner = open_position("w", "A", PositionAction::Buy, date(2024, 1, 1), dec!(100));
        winner.current_price = Some(dec!(110));
        let mut short_winner =
            open_position("s", "B", PositionAction::Sell, date(2024, 1, 1), dec!(100));
        short_winner.current_price = Some(dec!(80));
        let loser = closed_position(
            "l",
            "C",
            PositionAction::Buy,
            (date(2024, 1, 1), dec!(100)),
            (date(2024, 2, 1), dec!(90)),
        );
        let unpriced = open_position("u", "D", PositionAction::Buy, date(2024, 1, 1), dec!(100));
        let watch = watchlist_position("x", "E");

        let rate = win_rate_pct(&[winner, short_winner, loser, unpriced, watch]);
        approx(rate, dec!(66.6667), dec!(0.001));
        assert_eq!(win_rate_pct(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_profitable_weeks() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(); // Monday
        let returns = [
            dec!(0.01),
            dec!(0.01),
            dec!(0),
            dec!(0),
            dec!(0),
            dec!(-0.02),
            dec!(0),
            dec!(0),
        ];
        let days = crate::utils::time_utils::trading_days_between(
            start,
            start + chrono::Duration::days(13),
        );
        let points: Vec<DailyReturnPoint> = returns
            .iter()
            .zip(days)
            .map(|(r, d)| DailyReturnPoint {
                date: d,
                daily_return: *r,
                portfolio_value: dec!(0),
                benchmark_return: dec!(0),
                benchmark_value: dec!(0),
                active_count: 1,
            })
            .collect();

        // Week 1 positive, week 2 negative
        assert_eq!(profitable_weeks_pct(&points), dec!(50));
        assert_eq!(profitable_weeks_pct(&points[..6]), Decimal::ZERO);
    }
}
