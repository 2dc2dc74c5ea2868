use rust_decimal::Decimal;

use crate::constants::DECIMAL_PRECISION;
use crate::positions::{PortfolioBalance, Position};

/// Recomputes the cash record from the user's positions.
///
/// Only OPEN positions count: `total_invested` is their invested amount,
/// `available_cash = initial − total_invested` and `current_balance` adds
/// their current value back to the cash.
pub fn compute_balance(
    user_id: &str,
    initial_balance: Decimal,
    positions: &[Position],
) -> PortfolioBalance {
    let open = positions.iter().filter(|p| p.is_open());
    let (total_invested, current_value) = open.fold(
        (Decimal::ZERO, Decimal::ZERO),
        |(invested, value), p| (invested + p.invested_amount, value + p.current_value()),
    );
    let available_cash = initial_balance - total_invested;

    PortfolioBalance {
        user_id: user_id.to_string(),
        initial_balance,
        current_balance: (available_cash + current_value).round_dp(DECIMAL_PRECISION),
        available_cash: available_cash.round_dp(DECIMAL_PRECISION),
        total_invested: total_invested.round_dp(DECIMAL_PRECISION),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::positions::test_support::*;
    use crate::positions::PositionAction;
    use rust_decimal_macros::dec;

    #[test]
    fn test_balance_from_open_positions() {
        let mut gainer = with_sizing(
            open_position("a", "A", PositionAction::Buy, date(2024, 1, 2), dec!(100)),
            Some(dec!(60)),
            dec!(6000),
        );
        gainer.current_price = Some(dec!(120));
        let unpriced = with_sizing(
            open_position("b", "B", PositionAction::Buy, date(2024, 1, 2), dec!(50)),
            Some(dec!(40)),
            dec!(4000),
        );
        let closed = with_sizing(
            closed_position(
                "c",
                "C",
                PositionAction::Buy,
                (date(2024, 1, 2), dec!(10)),
                (date(2024, 1, 9), dec!(20)),
            ),
            None,
            dec!(9999),
        );

        let balance = compute_balance("user-1", dec!(100000), &[gainer, unpriced, closed]);

        assert_eq!(balance.total_invested, dec!(10000));
        assert_eq!(balance.available_cash, dec!(90000));
        // 7200 + 4000 at entry price
        assert_eq!(balance.current_balance, dec!(101200));
        assert_eq!(balance.initial_balance, dec!(100000));
    }

    #[test]
    fn test_empty_book_is_all_cash() {
        let balance = compute_balance("user-1", dec!(1000000), &[]);
        assert_eq!(balance, PortfolioBalance::new("user-1", dec!(1000000)));
    }
}
