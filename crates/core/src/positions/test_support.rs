//! Builders shared by unit tests across the crate.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{Position, PositionAction, PositionLifecycle, TradeMark};

pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub(crate) fn open_position(
    id: &str,
    ticker: &str,
    action: PositionAction,
    entry_date: NaiveDate,
    entry_price: Decimal,
) -> Position {
    Position {
        id: id.to_string(),
        user_id: "user-1".to_string(),
        ticker: ticker.to_string(),
        action,
        lifecycle: PositionLifecycle::Open {
            entry: TradeMark::new(entry_date, entry_price),
        },
        current_price: None,
        weight_pct: None,
        invested_amount: dec!(0),
        position_size: dec!(0),
        benchmark_ticker: "^NSEI".to_string(),
        entry_benchmark_price: None,
    }
}

pub(crate) fn closed_position(
    id: &str,
    ticker: &str,
    action: PositionAction,
    entry: (NaiveDate, Decimal),
    exit: (NaiveDate, Decimal),
) -> Position {
    let mut position = open_position(id, ticker, action, entry.0, entry.1);
    position.lifecycle = PositionLifecycle::Closed {
        entry: TradeMark::new(entry.0, entry.1),
        exit: Some(TradeMark::new(exit.0, exit.1)),
    };
    position
}

pub(crate) fn watchlist_position(id: &str, ticker: &str) -> Position {
    let mut position = open_position(id, ticker, PositionAction::Watch, date(2024, 1, 1), dec!(1));
    position.lifecycle = PositionLifecycle::Watchlist;
    position
}

pub(crate) fn with_sizing(
    mut position: Position,
    weight_pct: Option<Decimal>,
    invested_amount: Decimal,
) -> Position {
    position.weight_pct = weight_pct;
    position.invested_amount = invested_amount;
    position
}
