use regex::Regex;
use rust_decimal::Decimal;
use std::sync::LazyLock;

use crate::core::decimal::parse_decimal;

/// `1,300`: comma followed by exactly three digits is a thousands separator.
static COMMA_THOUSANDS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+,[0-9]{3}$").unwrap());

/// `16.000`: dot followed by exactly three digits is a thousands separator.
static DOT_THOUSANDS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+\.[0-9]{3}$").unwrap());

/// Normalize a lot quantity token such as `32`, `1,300`, `16.000` or `2,5`.
///
/// Rules, first match wins:
/// 1. `digits,ddd` drops the comma (thousands).
/// 2. `digits.ddd` drops the dot (thousands).
/// 3. any other comma is a decimal separator.
/// 4. any other dot is dropped as well; a lone dot is never read as a
///    decimal point, so `16.5` becomes `165`.
/// 5. plain number.
///
/// Anything left unparseable becomes zero.
pub fn normalize_quantity(token: &str) -> Decimal {
    let normalized = if COMMA_THOUSANDS_RE.is_match(token) {
        token.replace(',', "")
    } else if DOT_THOUSANDS_RE.is_match(token) {
        token.replace('.', "")
    } else if token.contains(',') {
        token.replace(',', ".")
    } else if token.contains('.') {
        token.replace('.', "")
    } else {
        token.to_string()
    };

    match parse_decimal(&normalized) {
        Some(d) => d,
        None => {
            tracing::debug!(token, "unparseable lot quantity, using zero");
            Decimal::ZERO
        }
    }
}
