//! Per-field normalization of raw CSV values.
//!
//! Currency, percent, and count parsing never fail: a defective value
//! defaults to zero locally. Date parsing is the one exception: an
//! unparseable date marks the whole record invalid and the caller
//! excludes it.

use chrono::NaiveDate;

/// Date formats seen across the ad console and business exports.
const DATE_FORMATS: [&str; 5] = [
    "%b %d, %Y", // Sep 01, 2024
    "%B %d, %Y", // September 1, 2024
    "%m/%d/%y",  // 9/1/24
    "%m/%d/%Y",  // 09/01/2024
    "%Y-%m-%d",  // 2024-09-01
];

/// Parse a currency-formatted value ("$1,234.56") into a float.
/// Empty, missing, or unparseable input yields 0.0.
pub fn parse_currency(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '"' | '\''))
        .collect();
    cleaned.trim().parse::<f64>().unwrap_or(0.0)
}

/// Parse a percent-formatted value ("12.5%") into a float.
/// Empty, missing, or unparseable input yields 0.0.
pub fn parse_percent(raw: &str) -> f64 {
    let cleaned: String = raw.chars().filter(|c| !matches!(c, '%' | '"')).collect();
    cleaned.trim().parse::<f64>().unwrap_or(0.0)
}

/// Parse a count column into a non-negative integer. Exports sometimes
/// format counts with thousands separators, so this reuses the currency
/// cleaning before coercing.
pub fn parse_count(raw: &str) -> u64 {
    let value = parse_currency(raw);
    if value <= 0.0 {
        0
    } else {
        value.round() as u64
    }
}

/// Try each known export date format in turn. `None` means the record
/// carrying this date is invalid.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim().trim_matches('"');
    if trimmed.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_strips_symbols_and_separators() {
        assert_eq!(parse_currency("$1,234.56"), 1234.56);
        assert_eq!(parse_currency("\"$12,000\""), 12000.0);
        assert_eq!(parse_currency("42"), 42.0);
    }

    #[test]
    fn currency_defaults_to_zero() {
        assert_eq!(parse_currency(""), 0.0);
        assert_eq!(parse_currency("   "), 0.0);
        assert_eq!(parse_currency("n/a"), 0.0);
    }

    #[test]
    fn percent_strips_sign() {
        assert_eq!(parse_percent("12.5%"), 12.5);
        assert_eq!(parse_percent("\"3%\""), 3.0);
        assert_eq!(parse_percent(""), 0.0);
        assert_eq!(parse_percent("--"), 0.0);
    }

    #[test]
    fn counts_are_non_negative_integers() {
        assert_eq!(parse_count("1,204"), 1204);
        assert_eq!(parse_count("17.0"), 17);
        assert_eq!(parse_count("-3"), 0);
        assert_eq!(parse_count(""), 0);
    }

    #[test]
    fn dates_accept_mixed_export_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
        assert_eq!(parse_date("Sep 01, 2024"), Some(expected));
        assert_eq!(parse_date("September 1, 2024"), Some(expected));
        assert_eq!(parse_date("9/1/24"), Some(expected));
        assert_eq!(parse_date("09/01/2024"), Some(expected));
        assert_eq!(parse_date("2024-09-01"), Some(expected));
    }

    #[test]
    fn bad_dates_are_none_not_defaults() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date("13/45/2024"), None);
    }
}
