use chrono::NaiveDate;
use log::warn;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::time::Instant;

use super::performance_model::{DailyReturnPoint, DailyReturnSeries};
use crate::market_data::PriceHistory;
use crate::portfolio::timeline::TimelineResolver;
use crate::positions::Position;
use crate::utils::time_utils::previous_trading_day;

/// Builds the equal-weight daily return series.
///
/// The portfolio return for a day is the unweighted mean of the directional
/// returns of every position that could be priced that day; stored weights
/// do not enter this calculation. The first day of the range is the baseline
/// and reports a zero return.
pub struct DailyReturnCalculator<'a> {
    resolver: TimelineResolver<'a>,
    benchmark: Option<&'a PriceHistory>,
}

impl<'a> DailyReturnCalculator<'a> {
    pub fn new(
        positions: &'a [Position],
        histories: &'a HashMap<String, PriceHistory>,
        benchmark: Option<&'a PriceHistory>,
    ) -> Self {
        Self {
            resolver: TimelineResolver::new(positions, histories),
            benchmark,
        }
    }

    /// Computes one point per trading day in `days` (ascending). Stops early
    /// once `deadline` passes.
    pub fn calculate(&self, days: &[NaiveDate], deadline: Option<Instant>) -> DailyReturnSeries {
        let mut points = Vec::with_capacity(days.len());
        let mut truncated = false;

        for (idx, &day) in days.iter().enumerate() {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    warn!(
                        "Daily return computation exceeded its time budget at {} ({} of {} days)",
                        day,
                        idx,
                        days.len()
                    );
                    truncated = true;
                    break;
                }
            }

            let previous = previous_trading_day(day);
            let resolution = self.resolver.resolve_day(day, previous);

            let portfolio_value: Decimal = resolution.resolved.iter().map(|r| r.value()).sum();
            let daily_return = if idx == 0 || resolution.resolved.is_empty() {
                Decimal::ZERO
            } else {
                let total: Decimal = resolution.resolved.iter().map(|r| r.daily_return()).sum();
                total / Decimal::from(resolution.resolved.len())
            };

            let benchmark_value = self.benchmark_close(day).unwrap_or(Decimal::ZERO);
            let benchmark_return = if idx == 0 {
                Decimal::ZERO
            } else {
                self.benchmark_return(day, previous)
            };

            points.push(DailyReturnPoint {
                date: day,
                daily_return,
                portfolio_value,
                benchmark_return,
                benchmark_value,
                active_count: resolution.active_count,
            });
        }

        DailyReturnSeries { points, truncated }
    }

    fn benchmark_close(&self, day: NaiveDate) -> Option<Decimal> {
        self.benchmark.and_then(|h| h.close_at_or_before(day))
    }

    fn benchmark_return(&self, day: NaiveDate, previous: NaiveDate) -> Decimal {
        match (self.benchmark_close(day), self.benchmark_close(previous)) {
            (Some(current), Some(prior)) if !prior.is_zero() => current / prior - Decimal::ONE,
            _ => Decimal::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::PricePoint;
    use crate::positions::test_support::*;
    use crate::positions::PositionAction;
    use crate::utils::time_utils::trading_days_between;
    use rust_decimal_macros::dec;

    fn history(ticker: &str, points: &[(NaiveDate, Decimal)]) -> PriceHistory {
        PriceHistory::new(
            ticker,
            points.iter().map(|(d, c)| PricePoint::new(*d, *c)).collect(),
        )
    }

    #[test]
    fn test_equal_weight_mean_of_active_positions() {
        // Mon 4th .. Wed 6th March 2024
        let positions = vec![
            with_sizing(
                open_position("a", "A", PositionAction::Buy, date(2024, 3, 4), dec!(100)),
                Some(dec!(80)),
                dec!(800),
            ),
            with_sizing(
                open_position("b", "B", PositionAction::Buy, date(2024, 3, 4), dec!(50)),
                Some(dec!(20)),
                dec!(200),
            ),
        ];
        let mut hist = HashMap::new();
        hist.insert(
            "A".to_string(),
            history(
                "A",
                &[
                    (date(2024, 3, 4), dec!(100)),
                    (date(2024, 3, 5), dec!(110)),
                ],
            ),
        );
        hist.insert(
            "B".to_string(),
            history(
                "B",
                &[(date(2024, 3, 4), dec!(50)), (date(2024, 3, 5), dec!(45))],
            ),
        );

        let calc = DailyReturnCalculator::new(&positions, &hist, None);
        let series = calc.calculate(&trading_days_between(date(2024, 3, 4), date(2024, 3, 5)), None);

        assert_eq!(series.points.len(), 2);
        assert_eq!(series.points[0].daily_return, dec!(0));
        // (+10% + -10%) / 2, weights ignored
        assert_eq!(series.points[1].daily_return, dec!(0));
        assert_eq!(series.points[1].portfolio_value, dec!(880) + dec!(180));
        assert_eq!(series.points[1].active_count, 2);
    }

    #[test]
    fn test_benchmark_series_uses_carried_forward_closes() {
        let positions = vec![open_position(
            "a",
            "A",
            PositionAction::Buy,
            date(2024, 3, 4),
            dec!(100),
        )];
        let hist = HashMap::new();
        let bench = history(
            "^NSEI",
            &[
                (date(2024, 3, 1), dec!(200)),
                (date(2024, 3, 5), dec!(220)),
            ],
        );

        let calc = DailyReturnCalculator::new(&positions, &hist, Some(&bench));
        let series = calc.calculate(&trading_days_between(date(2024, 3, 4), date(2024, 3, 6)), None);

        assert_eq!(series.points[0].benchmark_value, dec!(200));
        assert_eq!(series.points[0].benchmark_return, dec!(0));
        assert_eq!(series.points[1].benchmark_return, dec!(0.1));
        assert_eq!(series.points[2].benchmark_return, dec!(0));
        assert_eq!(series.points[2].benchmark_value, dec!(220));
    }

    #[test]
    fn test_expired_deadline_truncates() {
        let positions = vec![open_position(
            "a",
            "A",
            PositionAction::Buy,
            date(2024, 3, 4),
            dec!(100),
        )];
        let hist = HashMap::new();
        let calc = DailyReturnCalculator::new(&positions, &hist, None);

        let series = calc.calculate(
            &trading_days_between(date(2024, 3, 4), date(2024, 3, 8)),
            Some(Instant::now()),
        );

        assert!(series.truncated);
        assert!(series.points.is_empty());
    }

    #[test]
    fn test_days_without_priced_positions_report_zero() {
        let positions = vec![open_position(
            "a",
            "GAP",
            PositionAction::Buy,
            date(2024, 3, 4),
            dec!(100),
        )];
        let hist = HashMap::new();
        let calc = DailyReturnCalculator::new(&positions, &hist, None);

        let series = calc.calculate(&trading_days_between(date(2024, 3, 4), date(2024, 3, 6)), None);

        assert_eq!(series.points.len(), 3);
        assert!(series.points.iter().all(|p| p.daily_return.is_zero()));
        assert_eq!(series.points[2].active_count, 1);
    }
}
