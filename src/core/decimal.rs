//! Decimal parsing and display helpers.
//!
//! NFe numbers are dot-decimal with no grouping (`"1234.50"`). Display text
//! uses a decimal comma with no grouping (`"1234,50"`), the form Brazilian
//! spreadsheet imports expect.

use rust_decimal::Decimal;
use std::str::FromStr;

/// Parse a dot-decimal number, tolerating a bare leading or trailing point
/// (`".5"`, `"5."`). Returns `None` for anything else that is not a number.
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    let text = text.trim();
    let text = text.strip_suffix('.').unwrap_or(text);
    if text.is_empty() {
        return None;
    }
    if let Some(frac) = text.strip_prefix('.') {
        return Decimal::from_str(&format!("0.{frac}")).ok();
    }
    Decimal::from_str(text).ok()
}

/// Parse an XML numeric field, recovering missing or garbage text as zero.
pub fn decimal_or_zero(field: &str, text: &str) -> Decimal {
    if text.trim().is_empty() {
        return Decimal::ZERO;
    }
    match parse_decimal(text) {
        Some(d) => d,
        None => {
            tracing::debug!(field, value = text, "unparseable decimal, using zero");
            Decimal::ZERO
        }
    }
}

/// Render a decimal with a comma separator, keeping its scale as read.
pub fn format_decimal_comma(d: Decimal) -> String {
    d.to_string().replace('.', ",")
}
