//! Raw mouse telemetry: loosely-typed movement records from the capture script,
//! validated and normalized into ordered coordinate pairs.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One reported pointer position. Capture scripts are inconsistent about types
/// (`x` may arrive as a number or a numeric string) and attach extra fields we
/// don't care about; everything beyond `x`/`y` is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementSample {
    #[serde(default)]
    pub x: Value,
    #[serde(default)]
    pub y: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
}

impl MovementSample {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: Value::from(x),
            y: Value::from(y),
            timestamp: None,
        }
    }
}

/// Coerce a JSON value to a finite f64: numbers pass through, numeric strings
/// are parsed, anything else is rejected.
fn coerce(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Extract ordered (x, y) coordinates from raw movement records. Records whose
/// `x` or `y` cannot be coerced to a number are skipped, not fatal; order of
/// the survivors is preserved. Callers must treat fewer than 3 survivors as
/// insufficient data.
pub fn parse_coordinates(movements: &[MovementSample]) -> Vec<(f64, f64)> {
    movements
        .iter()
        .filter_map(|m| Some((coerce(&m.x)?, coerce(&m.y)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample(x: Value, y: Value) -> MovementSample {
        MovementSample {
            x,
            y,
            timestamp: None,
        }
    }

    #[test]
    fn numeric_and_string_coordinates_both_parse() {
        let movements = vec![
            sample(json!(10), json!(20.5)),
            sample(json!("30"), json!("40.25")),
        ];
        let coords = parse_coordinates(&movements);
        assert_eq!(coords, vec![(10.0, 20.5), (30.0, 40.25)]);
    }

    #[test]
    fn uncoercible_records_are_skipped_in_order() {
        let movements = vec![
            sample(json!("a"), json!("b")),
            sample(json!(1), json!(1)),
            sample(json!(null), json!(2)),
            sample(json!(3), json!(4)),
        ];
        let coords = parse_coordinates(&movements);
        assert_eq!(coords, vec![(1.0, 1.0), (3.0, 4.0)]);
    }

    #[test]
    fn missing_fields_default_to_null_and_skip() {
        let m: MovementSample = serde_json::from_str("{\"pressure\": 0.4}").unwrap();
        assert!(parse_coordinates(&[m]).is_empty());
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let movements = vec![sample(json!("NaN"), json!(1)), sample(json!("inf"), json!(2))];
        assert!(parse_coordinates(&movements).is_empty());
    }
}
