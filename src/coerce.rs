//! Coercion of text fields into the numeric types the reports work with.
//!
//! Exports deliver numbers as text, sometimes blank and sometimes garbage.
//! A value that cannot be coerced never aborts a run: it becomes `None` and
//! the calling pipeline decides whether that means `0` or an empty cell.

use log::warn;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Returns the field only if it carries a non-blank value.
pub fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// Largest magnitude accepted for an amount (10^24). Keeps sums, differences
/// and `* 100` of two accepted values inside `Decimal`'s range.
const MAX_MAGNITUDE: Decimal =
    Decimal::from_parts(2_701_131_776, 466_537_709, 54_210, false, 0);

/// Plain or scientific notation.
pub fn parse_decimal(s: &str) -> Option<Decimal> {
    s.parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_scientific(s).ok())
}

/// Parses a decimal field. Blank is `None` silently; malformed or out of
/// range is `None` with a warning naming the column.
pub fn decimal(raw: Option<&str>, column: &str) -> Option<Decimal> {
    let s = present(raw)?;
    let Some(value) = parse_decimal(s) else {
        warn!("non-numeric value in {column}: {s:?}");
        return None;
    };
    if value.abs() >= MAX_MAGNITUDE {
        warn!("value out of range in {column}: {s:?}");
        return None;
    }
    Some(value)
}

pub fn decimal_or_zero(raw: Option<&str>, column: &str) -> Decimal {
    decimal(raw, column).unwrap_or(Decimal::ZERO)
}

/// Parses a merchant id. Integral decimals such as `"42.0"` are accepted
/// since float-typed exports render ids that way.
pub fn merchant_id(raw: Option<&str>, column: &str) -> Option<i64> {
    let s = present(raw)?;
    let id = s.parse::<i64>().ok().or_else(|| {
        parse_decimal(s)
            .filter(|d| d.fract().is_zero())
            .and_then(|d| d.to_i64())
    });
    if id.is_none() {
        warn!("non-integer value in {column}: {s:?}");
    }
    id
}
