use chrono::{Datelike, Months, NaiveDate};

/// Maximum fraction digits shown for amounts (matches the ja-JP locale).
const MAX_FRACTION_DIGITS: usize = 3;

/// Format a number with `,` thousands separators and at most three
/// fraction digits, trailing zeros trimmed: `1234567.5` -> `1,234,567.5`.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let fixed = format!("{:.*}", MAX_FRACTION_DIGITS, value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let is_zero = int_part.chars().all(|c| c == '0') && frac_part.is_empty();
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };

    if frac_part.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, frac_part)
    }
}

/// Format an amount as yen: `¥1,234`, negative values as `-¥1,234`.
pub fn format_currency(value: f64) -> String {
    let formatted = format_number(value);
    match formatted.strip_prefix('-') {
        Some(rest) => format!("-¥{}", rest),
        None => format!("¥{}", formatted),
    }
}

/// Format a date the way the ja-JP locale does: `2024/3/5`.
pub fn format_date(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.year(), date.month(), date.day())
}

/// `YYYYMM` key for the month containing `date`.
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}{:02}", date.year(), date.month())
}

/// Parse a `YYYYMM` key into the first day of that month.
pub fn parse_month_key(key: &str) -> Option<NaiveDate> {
    if key.len() != 6 || !key.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let year: i32 = key[..4].parse().ok()?;
    let month: u32 = key[4..].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// Move a `YYYYMM` key by `delta` months. Invalid keys are returned unchanged.
pub fn shift_month(key: &str, delta: i32) -> String {
    let Some(first) = parse_month_key(key) else {
        return key.to_string();
    };
    let shifted = if delta >= 0 {
        first.checked_add_months(Months::new(delta as u32))
    } else {
        first.checked_sub_months(Months::new(delta.unsigned_abs()))
    };
    shifted.map(month_key).unwrap_or_else(|| key.to_string())
}

/// First and last day of the month containing `date`.
pub fn month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = date.with_day(1).unwrap_or(date);
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date);
    (first, last)
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(999.0), "999");
        assert_eq!(format_number(1000.0), "1,000");
        assert_eq!(format_number(1234567.0), "1,234,567");
        assert_eq!(format_number(1234.5), "1,234.5");
        assert_eq!(format_number(0.12345), "0.123");
        assert_eq!(format_number(-45000.0), "-45,000");
        assert_eq!(format_number(-0.0001), "0");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(60000.0), "¥60,000");
        assert_eq!(format_currency(-1500.0), "-¥1,500");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(date(2024, 3, 5)), "2024/3/5");
    }

    #[test]
    fn test_month_key_round_trip() {
        assert_eq!(month_key(date(2024, 3, 31)), "202403");
        assert_eq!(parse_month_key("202403"), Some(date(2024, 3, 1)));
        assert_eq!(parse_month_key("202413"), None);
        assert_eq!(parse_month_key("2024-3"), None);
    }

    #[test]
    fn test_shift_month() {
        assert_eq!(shift_month("202401", -1), "202312");
        assert_eq!(shift_month("202412", 1), "202501");
        assert_eq!(shift_month("202406", 0), "202406");
        assert_eq!(shift_month("bogus", 1), "bogus");
    }

    #[test]
    fn test_month_bounds() {
        assert_eq!(month_bounds(date(2024, 2, 14)), (date(2024, 2, 1), date(2024, 2, 29)));
        assert_eq!(month_bounds(date(2023, 12, 1)), (date(2023, 12, 1), date(2023, 12, 31)));
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("食費と日用品", 5), "食費...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
    }
}
