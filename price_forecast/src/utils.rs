//! Utility functions for the price_forecast crate

use chrono::{Days, NaiveDate};

/// Parsing and formatting of calendar dates
pub mod date_parser {
    use chrono::NaiveDate;

    /// Format used for every date this crate emits
    pub const DATE_FORMAT: &str = "%Y-%m-%d";

    /// Accepted input formats, tried in order. Two digit years come before
    /// their four digit counterparts since `%Y` also accepts short years.
    const FMTS: [&str; 8] = [
        "%d/%m/%y", "%d-%m-%y", "%d.%m.%y", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d",
        "%Y/%m/%d",
    ];

    /// Parse a day-first date such as `31/12/2023`.
    ///
    /// Also accepts `-` or `.` separators, two digit years and ISO
    /// `yyyy-mm-dd` or `yyyy/mm/dd`. A trailing time of day after a space or
    /// `T` is ignored.
    pub fn parse_date(input: &str) -> Option<NaiveDate> {
        let token = input.trim().split([' ', 'T']).next()?;
        FMTS.iter().find_map(|fmt| NaiveDate::parse_from_str(token, fmt).ok())
    }

    /// Format a date as ISO-8601 (`%Y-%m-%d`)
    pub fn format_date(date: NaiveDate) -> String {
        date.format(DATE_FORMAT).to_string()
    }
}

/// Parse a price written with a comma decimal separator, e.g. `"51,50"`.
///
/// Only an optional sign, digits and a single comma are accepted; a `.` or
/// any grouping character makes the value malformed. Non-finite results are
/// rejected.
pub fn parse_decimal_comma(input: &str) -> Option<f64> {
    let trimmed = input.trim();
    let unsigned = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);

    if !unsigned.chars().any(|c| c.is_ascii_digit())
        || !unsigned.chars().all(|c| c.is_ascii_digit() || c == ',')
        || unsigned.matches(',').count() > 1
    {
        return None;
    }

    let value: f64 = trimmed.replace(',', ".").parse().ok()?;
    value.is_finite().then_some(value)
}

/// Consecutive calendar days following `last`
pub fn future_dates(last: NaiveDate, horizon: usize) -> Option<Vec<NaiveDate>> {
    (1..=horizon as u64)
        .map(|offset| last.checked_add_days(Days::new(offset)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::date_parser::*;
    use super::*;

    #[test]
    fn test_day_first_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        assert_eq!(parse_date("31/12/2023"), Some(expected));
        assert_eq!(parse_date("31-12-2023"), Some(expected));
        assert_eq!(parse_date("31.12.2023"), Some(expected));
        assert_eq!(parse_date("31/12/23"), Some(expected));
        assert_eq!(parse_date("2023-12-31"), Some(expected));
        assert_eq!(parse_date("2023/12/31"), Some(expected));
        assert_eq!(parse_date(" 31/12/2023 00:00:00 "), Some(expected));
    }

    #[test]
    fn test_rejected_dates() {
        assert_eq!(parse_date("12/31/2023"), None);
        assert_eq!(parse_date("31/12-2023"), None);
        assert_eq!(parse_date("2023.12.31"), None);
        assert_eq!(parse_date("not-a-date"), None);
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("30/02/2024"), None);
    }

    #[test]
    fn test_prices() {
        assert_eq!(parse_decimal_comma("50,00"), Some(50.0));
        assert_eq!(parse_decimal_comma(" 51,5 "), Some(51.5));
        assert_eq!(parse_decimal_comma("-3,25"), Some(-3.25));
        assert_eq!(parse_decimal_comma("72"), Some(72.0));
        assert_eq!(parse_decimal_comma("abc"), None);
        assert_eq!(parse_decimal_comma("50.00"), None);
        assert_eq!(parse_decimal_comma("1,234,5"), None);
        assert_eq!(parse_decimal_comma(","), None);
        assert_eq!(parse_decimal_comma(""), None);
        assert_eq!(parse_decimal_comma("inf"), None);
    }

    #[test]
    fn test_future_dates_cross_month() {
        let last = NaiveDate::from_ymd_opt(2024, 2, 28).unwrap();
        let dates = future_dates(last, 3).unwrap();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
            ]
        );
    }
}
