use chrono::NaiveDate;
use log::trace;
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::errors::CalculatorError;
use crate::market_data::PriceHistory;
use crate::positions::Position;

/// A position active on a day, with both prices needed for its daily return.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedPosition<'a> {
    pub position: &'a Position,
    pub price: Decimal,
    pub previous_price: Decimal,
}

impl ResolvedPosition<'_> {
    /// Directional return from the previous trading day to this one.
    pub fn daily_return(&self) -> Decimal {
        if self.previous_price.is_zero() {
            return Decimal::ZERO;
        }
        self.position
            .action
            .signed_return(self.price / self.previous_price - Decimal::ONE)
    }

    /// `invested_amount` marked to this day's price.
    pub fn value(&self) -> Decimal {
        self.position.value_at_price(self.price)
    }
}

/// Resolution of every position for one trading day.
#[derive(Debug, Clone)]
pub struct DayResolution<'a> {
    pub date: NaiveDate,
    pub resolved: Vec<ResolvedPosition<'a>>,
    /// Active positions, including those skipped for lack of a price.
    pub active_count: usize,
}

/// Determines which positions are active on a day and the price each one
/// carries on that day and on the previous trading day.
///
/// Price priority for day D:
/// 1. the exit price once the exit date is on or before D;
/// 2. on the entry day, the close on or before D, else the entry price;
/// 3. otherwise the close on or before D.
///
/// For the previous trading day P the entry price is the baseline when D is
/// the entry day or P is the entry day; otherwise P is priced like any other
/// day, so a weekend entry is measured from the last close.
pub struct TimelineResolver<'a> {
    positions: Vec<&'a Position>,
    histories: &'a HashMap<String, PriceHistory>,
}

impl<'a> TimelineResolver<'a> {
    /// Keeps only open and closed positions; watchlist entries are ignored.
    pub fn new(positions: &'a [Position], histories: &'a HashMap<String, PriceHistory>) -> Self {
        Self {
            positions: positions.iter().filter(|p| p.is_tradable()).collect(),
            histories,
        }
    }

    pub fn positions(&self) -> &[&'a Position] {
        &self.positions
    }

    pub fn active_on(&self, day: NaiveDate) -> impl Iterator<Item = &'a Position> + '_ {
        self.positions
            .iter()
            .copied()
            .filter(move |p| p.is_active_on(day))
    }

    fn history_close(&self, position: &Position, day: NaiveDate) -> Option<Decimal> {
        self.histories
            .get(&position.ticker)
            .and_then(|h| h.close_at_or_before(day))
    }

    /// Effective price of `position` on `day`.
    pub fn price_on(&self, position: &Position, day: NaiveDate) -> Option<Decimal> {
        let entry = position.entry()?;
        if let Some(exit) = position.exit() {
            if exit.date <= day {
                return Some(exit.price);
            }
        }
        if day == entry.date {
            return Some(self.history_close(position, day).unwrap_or(entry.price));
        }
        if day < entry.date {
            return None;
        }
        self.history_close(position, day)
    }

    /// Baseline price of `position` on the trading day `previous` that
    /// precedes the active day `day`.
    pub fn previous_price(
        &self,
        position: &Position,
        day: NaiveDate,
        previous: NaiveDate,
    ) -> Option<Decimal> {
        let entry = position.entry()?;
        if let Some(exit) = position.exit() {
            if exit.date <= previous {
                return Some(exit.price);
            }
        }
        if day == entry.date || previous == entry.date {
            return Some(entry.price);
        }
        self.history_close(position, previous)
    }

    /// Resolves all active positions for `day`. Positions without a
    /// resolvable price are skipped for that day only.
    pub fn resolve_day(&self, day: NaiveDate, previous: NaiveDate) -> DayResolution<'a> {
        let mut resolved = Vec::new();
        let mut active_count = 0;

        for position in self.active_on(day) {
            active_count += 1;
            match (
                self.price_on(position, day),
                self.previous_price(position, day, previous),
            ) {
                (Some(price), Some(previous_price)) => resolved.push(ResolvedPosition {
                    position,
                    price,
                    previous_price,
                }),
                (None, _) => trace!(
                    "{}",
                    CalculatorError::PriceUnavailable {
                        ticker: position.ticker.clone(),
                        date: day,
                    }
                ),
                (_, None) => trace!(
                    "{}",
                    CalculatorError::PriceUnavailable {
                        ticker: position.ticker.clone(),
                        date: previous,
                    }
                ),
            }
        }

        DayResolution {
            date: day,
            resolved,
            active_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::PricePoint;
    use crate::positions::test_support::*;
    use crate::positions::PositionAction;
    use rust_decimal_macros::dec;

    fn histories(entries: &[(&str, &[(NaiveDate, Decimal)])]) -> HashMap<String, PriceHistory> {
        entries
            .iter()
            .map(|(ticker, points)| {
                (
                    ticker.to_string(),
                    PriceHistory::new(
                        *ticker,
                        points.iter().map(|(d, c)| PricePoint::new(*d, *c)).collect(),
                    ),
                )
            })
            .collect()
    }

    #[test]
    fn test_entry_day_uses_entry_price_as_baseline() {
        // Entry Monday 2024-03-04 at 100, close that day 105.
        let positions = vec![open_position(
            "p1",
            "INFY.NS",
            PositionAction::Buy,
            date(2024, 3, 4),
            dec!(100),
        )];
        let hist = histories(&[("INFY.NS", &[(date(2024, 3, 4), dec!(105))])]);
        let resolver = TimelineResolver::new(&positions, &hist);

        let day = resolver.resolve_day(date(2024, 3, 4), date(2024, 3, 1));
        assert_eq!(day.active_count, 1);
        assert_eq!(day.resolved[0].price, dec!(105));
        assert_eq!(day.resolved[0].previous_price, dec!(100));
        assert_eq!(day.resolved[0].daily_return(), dec!(0.05));
    }

    #[test]
    fn test_entry_day_without_history_uses_entry_price() {
        let positions = vec![open_position(
            "p1",
            "NEW.NS",
            PositionAction::Buy,
            date(2024, 3, 4),
            dec!(100),
        )];
        let hist = HashMap::new();
        let resolver = TimelineResolver::new(&positions, &hist);

        let day = resolver.resolve_day(date(2024, 3, 4), date(2024, 3, 1));
        assert_eq!(day.resolved.len(), 1);
        assert_eq!(day.resolved[0].daily_return(), dec!(0));
    }

    #[test]
    fn test_sell_return_is_inverted() {
        let positions = vec![
            open_position("b", "X", PositionAction::Buy, date(2024, 3, 4), dec!(100)),
            open_position("s", "X", PositionAction::Sell, date(2024, 3, 4), dec!(100)),
        ];
        let hist = histories(&[(
            "X",
            &[(date(2024, 3, 4), dec!(100)), (date(2024, 3, 5), dec!(90))],
        )]);
        let resolver = TimelineResolver::new(&positions, &hist);

        let day = resolver.resolve_day(date(2024, 3, 5), date(2024, 3, 4));
        let buy = day.resolved.iter().find(|r| r.position.id == "b").unwrap();
        let sell = day.resolved.iter().find(|r| r.position.id == "s").unwrap();
        assert_eq!(buy.daily_return(), dec!(-0.1));
        assert_eq!(sell.daily_return(), dec!(0.1));
    }

    #[test]
    fn test_exit_price_is_immutable_after_exit() {
        let positions = vec![closed_position(
            "c",
            "X",
            PositionAction::Buy,
            (date(2024, 3, 4), dec!(100)),
            (date(2024, 3, 6), dec!(120)),
        )];
        let hist = histories(&[(
            "X",
            &[
                (date(2024, 3, 5), dec!(110)),
                (date(2024, 3, 6), dec!(130)),
                (date(2024, 3, 7), dec!(140)),
            ],
        )]);
        let resolver = TimelineResolver::new(&positions, &hist);

        let exit_day = resolver.resolve_day(date(2024, 3, 6), date(2024, 3, 5));
        assert_eq!(exit_day.resolved[0].price, dec!(120));
        assert_eq!(exit_day.resolved[0].previous_price, dec!(110));

        let after = resolver.resolve_day(date(2024, 3, 7), date(2024, 3, 6));
        assert_eq!(after.active_count, 0);
        assert_eq!(resolver.price_on(&positions[0], date(2024, 3, 7)), Some(dec!(120)));
    }

    #[test]
    fn test_missing_price_skips_position_for_day() {
        let positions = vec![open_position(
            "p1",
            "GAP",
            PositionAction::Buy,
            date(2024, 3, 4),
            dec!(100),
        )];
        let hist = HashMap::new();
        let resolver = TimelineResolver::new(&positions, &hist);

        let day = resolver.resolve_day(date(2024, 3, 6), date(2024, 3, 5));
        assert_eq!(day.active_count, 1);
        assert!(day.resolved.is_empty());
    }

    #[test]
    fn test_watchlist_positions_are_ignored() {
        let positions = vec![watchlist_position("w", "X")];
        let hist = HashMap::new();
        let resolver = TimelineResolver::new(&positions, &hist);
        assert!(resolver.positions().is_empty());
    }

    #[test]
    fn test_weekend_entry_measures_monday_from_last_close() {
        // Entered Saturday; Monday's previous trading day is Friday.
        let positions = vec![open_position(
            "p1",
            "X",
            PositionAction::Buy,
            date(2024, 3, 9),
            dec!(100),
        )];
        let hist = histories(&[(
            "X",
            &[(date(2024, 3, 8), dec!(95)), (date(2024, 3, 11), dec!(102))],
        )]);
        let resolver = TimelineResolver::new(&positions, &hist);

        let monday = resolver.resolve_day(date(2024, 3, 11), date(2024, 3, 8));
        assert_eq!(monday.resolved[0].previous_price, dec!(95));
        assert_eq!(monday.resolved[0].price, dec!(102));
        assert_eq!(
            monday.resolved[0].daily_return().round_dp(4),
            dec!(0.0737)
        );
    }

    #[test]
    fn test_day_after_entry_uses_entry_price_as_baseline() {
        let positions = vec![open_position(
            "p1",
            "X",
            PositionAction::Buy,
            date(2024, 3, 4),
            dec!(100),
        )];
        let hist = histories(&[(
            "X",
            &[(date(2024, 3, 4), dec!(104)), (date(2024, 3, 5), dec!(110))],
        )]);
        let resolver = TimelineResolver::new(&positions, &hist);

        let tuesday = resolver.resolve_day(date(2024, 3, 5), date(2024, 3, 4));
        assert_eq!(tuesday.resolved[0].previous_price, dec!(100));
        assert_eq!(tuesday.resolved[0].daily_return(), dec!(0.1));
    }
}
