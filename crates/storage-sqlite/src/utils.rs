//! Helpers for values stored as TEXT.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Storage format for calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a decimal column, accepting scientific notation written by other
/// tools. `None` for blank or unparsable text.
pub fn parse_decimal_tolerant(value: &str) -> Option<Decimal> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

pub fn parse_optional_decimal(value: Option<&str>) -> Option<Decimal> {
    value.and_then(parse_decimal_tolerant)
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Canonical text form for a decimal column.
pub fn format_decimal(value: Decimal) -> String {
    value.normalize().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_decimal_tolerant() {
        assert_eq!(parse_decimal_tolerant("12.50"), Some(dec!(12.5)));
        assert_eq!(parse_decimal_tolerant(" 7 "), Some(dec!(7)));
        assert_eq!(parse_decimal_tolerant("1.5e2"), Some(dec!(150)));
        assert_eq!(parse_decimal_tolerant(""), None);
        assert_eq!(parse_decimal_tolerant("abc"), None);
        assert_eq!(parse_optional_decimal(None), None);
    }

    #[test]
    fn test_date_and_decimal_formatting() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(format_date(date), "2024-03-05");
        assert_eq!(parse_date("2024-03-05"), Some(date));
        assert_eq!(parse_date("05/03/2024"), None);
        assert_eq!(format_decimal(dec!(10.500)), "10.5");
    }
}
