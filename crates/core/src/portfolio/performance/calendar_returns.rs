use chrono::{Datelike, NaiveDate};
use log::debug;
use rust_decimal::Decimal;
use std::collections::HashMap;

use super::performance_model::{CalendarReturns, MonthlyReturn, YearlyReturn};
use crate::market_data::PriceHistory;
use crate::positions::Position;
use crate::utils::time_utils::{first_day_of_month, first_day_of_next_month};

/// Value of the OPEN book at `instant`.
///
/// Instants before `today` use the last close on or before the instant;
/// otherwise, or when no close is known, the position's current price and
/// then its entry price.
pub fn portfolio_value_at(
    positions: &[Position],
    histories: &HashMap<String, PriceHistory>,
    instant: NaiveDate,
    today: NaiveDate,
) -> Decimal {
    positions
        .iter()
        .filter(|p| p.is_open())
        .filter_map(|p| {
            let entry = p.entry()?;
            if entry.date > instant {
                return None;
            }
            let historical = if instant < today {
                histories
                    .get(&p.ticker)
                    .and_then(|h| h.close_at_or_before(instant))
            } else {
                None
            };
            let price = historical.or_else(|| p.mark_price())?;
            Some(p.value_at_price(price))
        })
        .sum()
}

/// `100 × (Π(1 + m/100) − 1)` over monthly percentage returns.
pub fn compound_monthly_pct(monthly_pct: &[Decimal]) -> Decimal {
    let growth = monthly_pct
        .iter()
        .fold(Decimal::ONE, |acc, m| acc * (Decimal::ONE + m / Decimal::ONE_HUNDRED));
    (growth - Decimal::ONE) * Decimal::ONE_HUNDRED
}

/// Month-over-month and year-over-year return tables from the first year
/// with activity (never later than `start_year_floor`) through the month
/// containing `today`.
pub fn calculate_calendar_returns(
    positions: &[Position],
    histories: &HashMap<String, PriceHistory>,
    today: NaiveDate,
    start_year_floor: i32,
) -> CalendarReturns {
    let earliest_entry_year = positions
        .iter()
        .filter_map(|p| p.entry().map(|e| e.date.year()))
        .min();
    let Some(earliest_entry_year) = earliest_entry_year else {
        return CalendarReturns::default();
    };
    let start_year = earliest_entry_year.min(start_year_floor);

    let mut monthly = Vec::new();
    let mut yearly = Vec::new();

    for year in start_year..=today.year() {
        let last_month = if year == today.year() { today.month() } else { 12 };
        let mut year_months = Vec::with_capacity(last_month as usize);

        for month in 1..=last_month {
            let (Some(start), Some(end)) = (
                first_day_of_month(year, month),
                first_day_of_next_month(year, month),
            ) else {
                continue;
            };
            let start_value = portfolio_value_at(positions, histories, start, today);
            let end_value = portfolio_value_at(positions, histories, end, today);
            let return_pct = if start_value > Decimal::ZERO {
                (end_value - start_value) / start_value * Decimal::ONE_HUNDRED
            } else {
                Decimal::ZERO
            };
            year_months.push(return_pct);
            monthly.push(MonthlyReturn {
                year,
                month,
                start_value,
                end_value,
                return_pct,
            });
        }

        yearly.push(YearlyReturn {
            year,
            return_pct: compound_monthly_pct(&year_months),
        });
    }

    debug!(
        "Calendar returns: {} months across {} years",
        monthly.len(),
        yearly.len()
    );

    CalendarReturns { monthly, yearly }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::PricePoint;
    use crate::positions::test_support::*;
    use crate::positions::PositionAction;
    use rust_decimal_macros::dec;

    #[test]
    fn test_yearly_compounds_monthly_returns() {
        // 1.05 * 0.98 * 1.03 - 1
        let yearly = compound_monthly_pct(&[dec!(5), dec!(-2), dec!(3)]);
        assert_eq!(yearly, dec!(5.987));
    }

    #[test]
    fn test_value_uses_history_before_today_and_current_price_after() {
        let mut position = with_sizing(
            open_position("a", "A", PositionAction::Buy, date(2024, 1, 10), dec!(100)),
            None,
            dec!(1000),
        );
        position.current_price = Some(dec!(130));
        let mut hist = HashMap::new();
        hist.insert(
            "A".to_string(),
            PriceHistory::new(
                "A",
                vec![
                    PricePoint::new(date(2024, 1, 31), dec!(110)),
                    PricePoint::new(date(2024, 2, 29), dec!(120)),
                ],
            ),
        );
        let positions = vec![position];
        let today = date(2024, 3, 15);

        assert_eq!(
            portfolio_value_at(&positions, &hist, date(2024, 1, 1), today),
            dec!(0)
        );
        assert_eq!(
            portfolio_value_at(&positions, &hist, date(2024, 2, 1), today),
            dec!(1100)
        );
        assert_eq!(
            portfolio_value_at(&positions, &hist, date(2024, 4, 1), today),
            dec!(1300)
        );
    }

    #[test]
    fn test_closed_positions_do_not_count() {
        let position = with_sizing(
            closed_position(
                "c",
                "C",
                PositionAction::Buy,
                (date(2024, 1, 2), dec!(100)),
                (date(2024, 1, 20), dec!(150)),
            ),
            None,
            dec!(1000),
        );
        let value = portfolio_value_at(&[position], &HashMap::new(), date(2024, 2, 1), date(2024, 3, 1));
        assert_eq!(value, dec!(0));
    }

    #[test]
    fn test_calendar_table_shape() {
        let mut position = with_sizing(
            open_position("a", "A", PositionAction::Buy, date(2023, 12, 20), dec!(100)),
            None,
            dec!(1000),
        );
        position.current_price = Some(dec!(100));
        let mut hist = HashMap::new();
        hist.insert(
            "A".to_string(),
            PriceHistory::new(
                "A",
                vec![
                    PricePoint::new(date(2023, 12, 29), dec!(100)),
                    PricePoint::new(date(2024, 1, 31), dec!(110)),
                ],
            ),
        );

        let result = calculate_calendar_returns(&[position], &hist, date(2024, 2, 10), 2020);

        // 2020-01 through 2024-02
        assert_eq!(result.monthly.len(), 4 * 12 + 2);
        assert_eq!(result.yearly.len(), 5);
        assert_eq!(result.yearly[0].year, 2020);
        assert_eq!(result.yearly[0].return_pct, dec!(0));

        let jan_2024 = result
            .monthly
            .iter()
            .find(|m| m.year == 2024 && m.month == 1)
            .unwrap();
        assert_eq!(jan_2024.start_value, dec!(1000));
        assert_eq!(jan_2024.end_value, dec!(1100));
        assert_eq!(jan_2024.return_pct, dec!(10));

        // Feb ends in the future: current price
        let feb_2024 = result.monthly.last().unwrap();
        assert_eq!(feb_2024.end_value, dec!(1000));
    }

    #[test]
    fn test_no_positions_yields_empty_tables() {
        let result = calculate_calendar_returns(&[], &HashMap::new(), date(2024, 2, 10), 2020);
        assert!(result.monthly.is_empty());
        assert!(result.yearly.is_empty());
    }
}
