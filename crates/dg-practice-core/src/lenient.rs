//! Tolerant deserializers for documents written by older versions.
//!
//! Older documents stored counters as strings or floats, left them `null`, and
//! kept form values such as disc weight as raw text. These helpers coerce such
//! values on read; serialization always writes the canonical form.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Coerce a JSON value into a non-negative integer.
///
/// Numbers are truncated toward zero, numeric strings are parsed, and anything
/// else (including negatives, `NaN`, and `null`) becomes `0`.
#[must_use]
pub fn coerce_count(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().map(truncate_non_negative))
            .unwrap_or(0),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(truncate_non_negative)
            .unwrap_or(0),
        _ => 0,
    }
}

/// Coerce a JSON value into an optional number.
#[must_use]
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn truncate_non_negative(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        // `as` saturates at u64::MAX for out-of-range floats.
        value.trunc() as u64
    } else {
        0
    }
}

/// `deserialize_with` helper for counters.
///
/// # Errors
///
/// Never fails for well-formed JSON; malformed values coerce to `0`.
pub fn count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_count(&value))
}

/// `deserialize_with` helper for optional numbers such as disc weight.
///
/// # Errors
///
/// Never fails for well-formed JSON; malformed values become `None`.
pub fn opt_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_number(&value))
}
