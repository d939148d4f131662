//! Story point coercion.
//!
//! Trackers hand story points back in many shapes: a plain number, a
//! stringified number, an object wrapping the number under `value` or
//! `name`, or an unrelated array. Everything is folded into a single
//! non-negative `f64` here, once, at ingestion. Precedence:
//!
//! | Shape | Result |
//! |-------|--------|
//! | number | the number |
//! | string | its leading numeric prefix, else 0 |
//! | object with `value` | coercion of `value` |
//! | object with `name` | coercion of `name` |
//! | array | 0 |
//! | anything else | 0 |
//!
//! Negative and non-finite results clamp to 0.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

static LEADING_FLOAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?")
        .expect("leading float pattern is valid")
});

/// Coerce any JSON value into a story point count.
pub fn coerce(raw: &Value) -> f64 {
    let points = match raw {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => parse_leading_float(s).unwrap_or(0.0),
        Value::Object(map) => {
            if let Some(value) = map.get("value") {
                return coerce(value);
            }
            if let Some(name) = map.get("name") {
                return coerce(name);
            }
            0.0
        }
        Value::Array(_) | Value::Null | Value::Bool(_) => 0.0,
    };
    clamp(points)
}

/// Parse the longest numeric prefix of `text`, the way a lenient float
/// parser does ("5 pts" -> 5, "3.5" -> 3.5, "abc" -> None).
pub fn parse_leading_float(text: &str) -> Option<f64> {
    let m = LEADING_FLOAT.find(text)?;
    m.as_str().trim().parse::<f64>().ok()
}

fn clamp(points: f64) -> f64 {
    if points.is_finite() && points > 0.0 {
        points
    } else {
        0.0
    }
}

/// Serde adapter: `#[serde(deserialize_with = "points::deserialize")]`.
pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(coerce(&raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_passes_through() {
        assert_eq!(coerce(&json!(5)), 5.0);
        assert_eq!(coerce(&json!(2.5)), 2.5);
    }

    #[test]
    fn test_string_uses_numeric_prefix() {
        assert_eq!(coerce(&json!("5")), 5.0);
        assert_eq!(coerce(&json!(" 8 points")), 8.0);
        assert_eq!(coerce(&json!("1.5e1")), 15.0);
        assert_eq!(coerce(&json!("n/a")), 0.0);
        assert_eq!(coerce(&json!("")), 0.0);
    }

    #[test]
    fn test_nested_value_wins_over_name() {
        assert_eq!(coerce(&json!({"value": 3, "name": "8"})), 3.0);
        assert_eq!(coerce(&json!({"name": "8"})), 8.0);
        assert_eq!(coerce(&json!({"value": {"value": "2"}})), 2.0);
        assert_eq!(coerce(&json!({"value": null, "name": 8})), 0.0);
        assert_eq!(coerce(&json!({"other": 4})), 0.0);
    }

    #[test]
    fn test_arrays_and_scalars_degrade_to_zero() {
        assert_eq!(coerce(&json!([1, 2, 3])), 0.0);
        assert_eq!(coerce(&json!(null)), 0.0);
        assert_eq!(coerce(&json!(true)), 0.0);
    }

    #[test]
    fn test_negative_points_clamp_to_zero() {
        assert_eq!(coerce(&json!(-3)), 0.0);
        assert_eq!(coerce(&json!("-2")), 0.0);
    }
}
