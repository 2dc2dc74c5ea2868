use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;

/// Default timezone for valuation dates.
/// Recommendations are benchmarked against NSE indices, so "today" is the
/// Indian market date.
pub const DEFAULT_VALUATION_TZ: Tz = chrono_tz::Asia::Kolkata;

/// Converts a UTC instant to a valuation date in the given timezone.
pub fn valuation_date_from_utc(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Convenience function that uses the default valuation timezone.
pub fn valuation_date_today() -> NaiveDate {
    valuation_date_from_utc(Utc::now(), DEFAULT_VALUATION_TZ)
}

pub fn get_days_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    if start > end {
        return Vec::new();
    }
    start.iter_days().take_while(|d| *d <= end).collect()
}

/// Monday through Friday. No exchange holiday calendar is applied.
pub fn is_trading_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Trading days in `[start, end]`, ascending.
pub fn trading_days_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    get_days_between(start, end)
        .into_iter()
        .filter(|d| is_trading_day(*d))
        .collect()
}

/// The closest trading day strictly before `date`.
pub fn previous_trading_day(date: NaiveDate) -> NaiveDate {
    let mut current = date - Duration::days(1);
    while !is_trading_day(current) {
        current -= Duration::days(1);
    }
    current
}

pub fn first_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// First day of the month following `(year, month)`.
pub fn first_day_of_next_month(year: i32, month: u32) -> Option<NaiveDate> {
    if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
}
