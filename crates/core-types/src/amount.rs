//! Lenient monetary amount coercion.
//!
//! Amounts come from hand-typed forms, JSON bodies and spreadsheet cells. None of
//! those sources is allowed to fail a computation: anything that is not a finite
//! real number becomes `0.0`.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Maps non-finite values to zero and folds `-0.0` into `0.0`.
pub fn sanitize_amount(value: f64) -> f64 {
    if value.is_finite() { value + 0.0 } else { 0.0 }
}

/// Parses a textual amount, returning `0.0` for blank or unparseable input.
pub fn parse_amount(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .map(sanitize_amount)
        .unwrap_or(0.0)
}

/// Coerces an arbitrary JSON value into an amount.
///
/// Numbers pass through, numeric strings are parsed, everything else
/// (`null`, booleans, arrays, objects, garbage strings) is `0.0`.
pub fn coerce_json_amount(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().map(sanitize_amount).unwrap_or(0.0),
        Value::String(s) => parse_amount(s),
        _ => 0.0,
    }
}

/// `deserialize_with` helper for amount fields. Pair it with `#[serde(default)]`
/// so that an absent field also yields `0.0`.
pub fn deserialize_lenient_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_json_amount(&value))
}

/// `deserialize_with` helper for text fields that may arrive as numbers or `null`.
pub fn deserialize_lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}
