//! Value normalization helpers.
//!
//! Everything that touches raw spreadsheet text lives here: account number
//! cleanup, forgiving numeric parsing, Indian digit grouping and Excel serial
//! dates. The rest of the crate only sees display-ready strings.
use chrono::{Days, NaiveDate};
use num_format::{CustomFormat, Grouping, ToFormattedString};
use once_cell::sync::Lazy;

/// Excel's day zero once the 1900 leap-year bug is accounted for.
const EXCEL_EPOCH: (i32, u32, u32) = (1899, 12, 30);
const SERIAL_MIN: f64 = 20000.0;
const SERIAL_MAX: f64 = 60000.0;

/// Lakh/crore digit grouping: `1,23,45,678`.
static INDIAN: Lazy<CustomFormat> = Lazy::new(|| {
    CustomFormat::builder()
        .grouping(Grouping::Indian)
        .separator(",")
        .minus_sign("-")
        .build()
        .unwrap_or_default()
});

/// Integer counts (row totals and the like) with lakh/crore grouping.
pub fn format_int<T: ToFormattedString>(n: T) -> String {
    n.to_formatted_string(&*INDIAN)
}

/// Lakh/crore grouping of a plain digit string: the last three digits form one
/// group, every two digits before that form another.
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut out = String::with_capacity(digits.len() + digits.len() / 2);
    for (i, c) in head.chars().enumerate() {
        if i > 0 && (head.len() - i) % 2 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out.push(',');
    out.push_str(tail);
    out
}

/// Canonical account number: digits only, leading zeros kept.
///
/// A trailing `.0` left behind by a float-typed spreadsheet cell is dropped
/// before filtering, otherwise `123.0` would turn into `1230`.
pub fn normalize_account(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix(".0").unwrap_or(trimmed);
    trimmed.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in spreadsheet exports.
///
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters.
/// - Strips thousands separators like `","` before parsing.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(',', "");
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Numeric value of a cell, or NaN when it is not a number.
pub fn to_number(raw: &str) -> f64 {
    parse_f64_safe(Some(raw)).unwrap_or(f64::NAN)
}

/// Absolute value of a cell; unparseable input counts as zero.
pub fn to_absolute_magnitude(raw: &str) -> f64 {
    let n = to_number(raw);
    if n.is_nan() {
        0.0
    } else {
        n.abs()
    }
}

/// Indian-grouped number (`12,34,567.5`) with at most `max_fraction_digits`
/// decimals and no trailing zeros.
pub fn format_localized_number(n: f64, max_fraction_digits: usize) -> String {
    let fixed = format_fixed(n, max_fraction_digits);
    match fixed.split_once('.') {
        Some((int_part, frac)) => {
            let frac = frac.trim_end_matches('0');
            if frac.is_empty() {
                int_part.to_string()
            } else {
                format!("{}.{}", int_part, frac)
            }
        }
        None => fixed,
    }
}

/// Indian-grouped number with exactly `decimals` fraction digits.
pub fn format_fixed(n: f64, decimals: usize) -> String {
    if !n.is_finite() {
        return format_fixed(0.0, decimals);
    }
    // First, format to a plain fixed-decimal string like `1234567.89`.
    let s = format!("{:.*}", decimals, n.abs());
    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (s.as_str(), None),
    };
    let mut res = group_indian(int_part);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    // `-0.00` is not a useful thing to print.
    let is_zero = s.chars().all(|c| c == '0' || c == '.');
    if n.is_sign_negative() && !is_zero {
        format!("-{}", res)
    } else {
        res
    }
}

/// Render an Excel day serial as `DD-MM-YYYY`. Values outside the plausible
/// serial window (and non-numbers) come back trimmed but otherwise untouched,
/// since many rows already hold a human-readable date.
pub fn excel_serial_to_date(raw: &str) -> String {
    let trimmed = raw.trim();
    let serial = to_number(trimmed);
    if !(serial > SERIAL_MIN && serial < SERIAL_MAX) {
        return trimmed.to_string();
    }
    let (y, m, d) = EXCEL_EPOCH;
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|epoch| epoch.checked_add_days(Days::new(serial.floor() as u64)))
        .map(|date| date.format("%d-%m-%Y").to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_keeps_only_digits() {
        assert_eq!(normalize_account(" 00-123 "), "00123");
        assert_eq!(normalize_account("1234 5678 90"), "1234567890");
        assert_eq!(normalize_account("98,765"), "98765");
        assert_eq!(normalize_account("abc"), "");
    }

    #[test]
    fn account_drops_float_artefact() {
        assert_eq!(normalize_account("20012345.0"), "20012345");
        assert_eq!(normalize_account(" 20012345.0 "), "20012345");
        assert_eq!(normalize_account("20012345.05"), "2001234505");
    }

    #[test]
    fn to_number_is_forgiving() {
        assert_eq!(to_number("1,23,456.50"), 123456.5);
        assert_eq!(to_number("  -42 "), -42.0);
        assert!(to_number("").is_nan());
        assert!(to_number("n/a").is_nan());
        assert!(to_number("inf").is_nan());
    }

    #[test]
    fn magnitude_never_nan() {
        assert_eq!(to_absolute_magnitude("-1,500"), 1500.0);
        assert_eq!(to_absolute_magnitude("garbage"), 0.0);
    }

    #[test]
    fn indian_grouping() {
        assert_eq!(format_localized_number(12345678.0, 2), "1,23,45,678");
        assert_eq!(format_localized_number(1234.5, 2), "1,234.5");
        assert_eq!(format_localized_number(999.999, 2), "1,000");
        assert_eq!(format_localized_number(0.0, 2), "0");
        assert_eq!(format_localized_number(-60000.0, 2), "-60,000");
    }

    #[test]
    fn fixed_keeps_trailing_zeros() {
        assert_eq!(format_fixed(40.0, 2), "40.00");
        assert_eq!(format_fixed(100000.0, 2), "1,00,000.00");
        assert_eq!(format_fixed(-0.001, 2), "0.00");
        assert_eq!(format_fixed(f64::NAN, 2), "0.00");
    }

    #[test]
    fn grouping_has_no_magnitude_ceiling() {
        // Both values are exact in f64, so the digits below are the real ones.
        assert_eq!(format_fixed(1e22, 2), "10,00,00,00,00,00,00,00,00,00,000.00");
        assert_eq!(
            format_localized_number(2f64.powi(100), 2),
            "12,67,65,06,00,22,82,29,40,14,96,70,32,05,376"
        );
        assert_eq!(
            format_localized_number(-(2f64.powi(100)), 2),
            "-12,67,65,06,00,22,82,29,40,14,96,70,32,05,376"
        );
        let huge = format_localized_number(1e300, 2);
        assert!(huge.starts_with("10,00,00,00"), "{}", huge);
        assert_eq!(huge.chars().filter(char::is_ascii_digit).count(), 301);
    }

    #[test]
    fn counts_use_the_same_grouping() {
        assert_eq!(format_int(1_234_567u64), "12,34,567");
        assert_eq!(format_int(999usize), "999");
        assert_eq!(format_int(-100000i64), "-1,00,000");
        assert_eq!(format_localized_number(1_234_567.0, 2), format_int(1_234_567u64));
    }

    #[test]
    fn serial_dates() {
        assert_eq!(excel_serial_to_date("43190"), "31-03-2018");
        assert_eq!(excel_serial_to_date("45565"), "30-09-2024");
        assert_eq!(excel_serial_to_date("43190.75"), "31-03-2018");
        assert_eq!(excel_serial_to_date(" 15-03-2020 "), "15-03-2020");
        assert_eq!(excel_serial_to_date("20000"), "20000");
        assert_eq!(excel_serial_to_date("60000"), "60000");
    }
}
