//! Price decoding for both upstream encodings.
//!
//! JSON prices ending in `U` are kopecks; the storefront shows rubles as
//! formatted text such as `"48 000 ₽"` or `"1 299,50 ₽"`.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;

/// How a numeric price field is encoded upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceUnit {
    /// Hundredths of the currency unit.
    Minor,
    Major,
}

/// Converts a minor-unit amount to major units by truncating division.
///
/// `123_456` becomes `1234`, matching how the storefront displays prices.
#[must_use]
pub fn minor_to_major(minor: u64) -> Decimal {
    Decimal::from(minor / 100)
}

/// Reads a positive price from a JSON number or numeric string.
///
/// Zero means the field is unset and yields `None`. Minor-unit values must be
/// integral (`4800000` and `4800000.0` both qualify); fractional kopecks are
/// rejected. A non-zero minor value below one ruble decodes to `0`.
#[must_use]
pub fn decode_json_price(value: &Value, unit: PriceUnit) -> Option<Decimal> {
    match unit {
        PriceUnit::Minor => {
            let minor = match value {
                Value::Number(n) => n.as_u64().or_else(|| n.as_f64().and_then(integral_f64)),
                Value::String(s) => s.trim().parse::<u64>().ok(),
                _ => None,
            }?;
            (minor > 0).then(|| minor_to_major(minor))
        }
        PriceUnit::Major => {
            let text = match value {
                Value::Number(n) => n.to_string(),
                Value::String(s) => s.trim().to_string(),
                _ => return None,
            };
            let decimal = Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()?;
            (decimal > Decimal::ZERO).then(|| decimal.normalize())
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn integral_f64(raw: f64) -> Option<u64> {
    // 2^53: beyond this an f64 no longer holds every integer exactly.
    const EXACT_LIMIT: f64 = 9_007_199_254_740_992.0;
    (raw.is_finite() && raw >= 0.0 && raw.fract() == 0.0 && raw <= EXACT_LIMIT)
        .then_some(raw as u64)
}

/// Parses storefront price text, ignoring currency signs and digit grouping.
///
/// A trailing `,` or `.` followed by one or two digits is the decimal part;
/// any other separators are treated as grouping.
#[must_use]
pub fn parse_price_text(text: &str) -> Option<Decimal> {
    let kept: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    let (integer, fraction) = match kept.rfind([',', '.']) {
        Some(pos) if (1..=2).contains(&(kept.len() - pos - 1)) => (&kept[..pos], &kept[pos + 1..]),
        _ => (kept.as_str(), ""),
    };

    let digits: String = integer.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }

    let literal = if fraction.is_empty() {
        digits
    } else {
        format!("{digits}.{fraction}")
    };
    Decimal::from_str(&literal).ok().map(|d| d.normalize())
}
