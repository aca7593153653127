//! Locale-tolerant price text normalization
//!
//! Shops format the same amount as `1.234,56`, `1,234.56`, `$ 1234.56` or
//! `1234,56 €`. [`parse_price`] turns these into a [`Decimal`] without ever
//! going through floating point.

use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::trace;

/// Parses the first numeric amount in `text`
///
/// Rules, applied to the first run of `[0-9.,]` that contains a digit:
///
/// - both `.` and `,` present: the later one is the decimal point, the other
///   is a thousands separator
/// - only `,`: it is the decimal point when one or two digits follow the last
///   comma, otherwise commas are thousands separators (`"1,234"` is 1234)
/// - only `.` or no separator: parsed as is
/// - a leading separator is a decimal point with no integer part (`"$.99"`)
///
/// # Returns
///
/// * `Some(Decimal)` - The amount
/// * `None` - No digits, or the run does not reduce to a single decimal point
///
/// # Examples
///
/// ```
/// use price_sentinel::parse_price;
/// use rust_decimal::Decimal;
///
/// assert_eq!(parse_price("1.234,56"), Some(Decimal::new(123456, 2)));
/// assert_eq!(parse_price("$ 1,234.56"), Some(Decimal::new(123456, 2)));
/// assert_eq!(parse_price("sin precio"), None);
/// ```
pub fn parse_price(text: &str) -> Option<Decimal> {
    let run = numeric_run(text)?;
    let run = run.trim_end_matches(|c| c == '.' || c == ',');

    let normalized = match (run.rfind('.'), run.rfind(',')) {
        (Some(dot), Some(comma)) => {
            let (decimal, thousands) = if dot > comma { ('.', ',') } else { (',', '.') };
            run.chars()
                .filter(|&c| c != thousands)
                .map(|c| if c == decimal { '.' } else { c })
                .collect::<String>()
        }
        (None, Some(comma)) => {
            let digits_after = run.len() - comma - 1;
            if (1..=2).contains(&digits_after) {
                let (whole, fraction) = run.split_at(comma);
                format!("{}.{}", whole.replace(',', ""), &fraction[1..])
            } else {
                run.replace(',', "")
            }
        }
        _ => run.to_string(),
    };
    // ".99" and ",50" carry no integer part
    let normalized = if normalized.starts_with('.') {
        format!("0{}", normalized)
    } else {
        normalized
    };

    let parsed = Decimal::from_str(&normalized).ok();
    if parsed.is_none() {
        trace!(text, normalized = %normalized, "Unparseable price text");
    }
    parsed
}

/// First maximal run of digits, dots and commas that contains a digit
fn numeric_run(text: &str) -> Option<&str> {
    let is_numeric = |c: char| c.is_ascii_digit() || c == '.' || c == ',';
    let mut rest = text;

    loop {
        let start = rest.find(is_numeric)?;
        let tail = &rest[start..];
        let len = tail.find(|c: char| !is_numeric(c)).unwrap_or(tail.len());
        let run = &tail[..len];
        if run.chars().any(|c| c.is_ascii_digit()) {
            return Some(run);
        }
        rest = &tail[len..];
    }
}
