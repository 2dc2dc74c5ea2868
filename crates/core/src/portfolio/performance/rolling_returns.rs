use rust_decimal::Decimal;

use super::performance_model::{
    CumulativeReturnPoint, DailyReturnPoint, ReturnWindow, RollingReturnPoint,
};

/// `Π(1 + r_i) − 1`.
pub fn compound_returns(returns: &[Decimal]) -> Decimal {
    returns
        .iter()
        .fold(Decimal::ONE, |acc, r| acc * (Decimal::ONE + r))
        - Decimal::ONE
}

/// Running compounded return after each observation.
pub fn cumulative_series(returns: &[Decimal]) -> Vec<Decimal> {
    let mut growth = Decimal::ONE;
    returns
        .iter()
        .map(|r| {
            growth *= Decimal::ONE + r;
            growth - Decimal::ONE
        })
        .collect()
}

/// Compounded return of the `window` observations ending at each index.
/// Indices with fewer than `window` observations behind them report zero.
pub fn rolling_series(returns: &[Decimal], window: usize) -> Vec<Decimal> {
    let window = window.max(1);
    (0..returns.len())
        .map(|t| {
            if t + 1 < window {
                Decimal::ZERO
            } else {
                compound_returns(&returns[t + 1 - window..=t])
            }
        })
        .collect()
}

/// Indices emitted for a window: every day for DAY, otherwise every
/// `window_days`-th trading day plus the final day.
pub fn sample_indices(len: usize, window: ReturnWindow) -> Vec<usize> {
    if len == 0 {
        return Vec::new();
    }
    let step = window.window_days();
    if step <= 1 {
        return (0..len).collect();
    }
    let mut indices: Vec<usize> = (step - 1..len).step_by(step).collect();
    if indices.last() != Some(&(len - 1)) {
        indices.push(len - 1);
    }
    indices
}

/// Samples rolling and cumulative returns (fractional) from a daily series.
pub fn aggregate_returns(
    points: &[DailyReturnPoint],
    window: ReturnWindow,
) -> (Vec<RollingReturnPoint>, Vec<CumulativeReturnPoint>) {
    let returns: Vec<Decimal> = points.iter().map(|p| p.daily_return).collect();
    let rolling = rolling_series(&returns, window.window_days());
    let cumulative = cumulative_series(&returns);

    sample_indices(points.len(), window)
        .into_iter()
        .map(|idx| {
            let point = &points[idx];
            (
                RollingReturnPoint {
                    date: point.date,
                    period_return: rolling[idx],
                    active_count: point.active_count,
                },
                CumulativeReturnPoint {
                    date: point.date,
                    cumulative_return: cumulative[idx],
                    active_count: point.active_count,
                },
            )
        })
        .unzip()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn points(returns: &[Decimal]) -> Vec<DailyReturnPoint> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        returns
            .iter()
            .enumerate()
            .map(|(i, r)| DailyReturnPoint {
                date: start + chrono::Duration::days(i as i64),
                daily_return: *r,
                portfolio_value: dec!(0),
                benchmark_return: dec!(0),
                benchmark_value: dec!(0),
                active_count: 1,
            })
            .collect()
    }

    #[test]
    fn test_compound_returns() {
        let total = compound_returns(&[dec!(0.01), dec!(-0.02), dec!(0.03)]);
        // 1.01 * 0.98 * 1.03 - 1
        assert_eq!(total, dec!(0.019494));
    }

    #[test]
    fn test_compound_of_empty_is_zero() {
        assert_eq!(compound_returns(&[]), dec!(0));
    }

    #[test]
    fn test_rolling_zero_before_full_window() {
        let rolling = rolling_series(&[dec!(0.1), dec!(0.1), dec!(0.1)], 2);
        assert_eq!(rolling, vec![dec!(0), dec!(0.21), dec!(0.21)]);
    }

    #[test]
    fn test_sample_indices_week() {
        assert_eq!(sample_indices(15, ReturnWindow::Week), vec![6, 13, 14]);
        assert_eq!(sample_indices(14, ReturnWindow::Week), vec![6, 13]);
        assert_eq!(sample_indices(3, ReturnWindow::Week), vec![2]);
        assert_eq!(sample_indices(3, ReturnWindow::Day), vec![0, 1, 2]);
        assert!(sample_indices(0, ReturnWindow::Month).is_empty());
    }

    #[test]
    fn test_sample_indices_month() {
        assert_eq!(sample_indices(61, ReturnWindow::Month), vec![29, 59, 60]);
    }

    #[test]
    fn test_aggregate_last_point_reflects_latest_window() {
        let mut returns = vec![dec!(0); 8];
        returns[7] = dec!(0.05);
        let (rolling, cumulative) = aggregate_returns(&points(&returns), ReturnWindow::Week);

        assert_eq!(rolling.len(), 2);
        assert_eq!(rolling[0].period_return, dec!(0));
        assert_eq!(rolling[1].period_return, dec!(0.05));
        assert_eq!(cumulative[1].cumulative_return, dec!(0.05));
        assert_eq!(rolling[1].date, cumulative[1].date);
    }
}
