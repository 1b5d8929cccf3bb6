use serde::{Deserialize, Serialize};

/// A single metric value, narrowed from an arbitrary JSON value.
///
/// Spec.md §3 drops strings and nulls from the telemetry field set and
/// requires booleans to be checked *before* integers in type dispatch
/// (some source languages treat `bool` as a subtype of `int`, which is the
/// exact hazard this tagged union exists to eliminate — see spec.md §9).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl MetricValue {
    /// Convert a `serde_json::Value` into a metric value.
    ///
    /// Returns `None` for strings, null, arrays, and objects — these are
    /// dropped per spec.md §3, never coerced. Boolean is checked before
    /// integer/float so a JSON `true`/`false` is never misread as `1`/`0`.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(Self::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Self::Int(i))
                } else {
                    n.as_f64().map(Self::Float)
                }
            }
            serde_json::Value::String(_) | serde_json::Value::Null => None,
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
        }
    }

    /// Render this value in line-protocol field syntax.
    ///
    /// Exhaustive match over the three variants: boolean becomes
    /// `true`/`false`, integer gets an `i` suffix, float is left bare.
    #[must_use]
    pub fn to_line_protocol(self) -> String {
        match self {
            Self::Bool(b) => if b { "true" } else { "false" }.to_owned(),
            Self::Int(i) => format!("{i}i"),
            Self::Float(f) => format!("{f}"),
        }
    }

    /// Compare this value against a numeric threshold per a [`Comparator`].
    ///
    /// Booleans are compared as 0.0/1.0. NaN never matches any comparator —
    /// spec.md §3's invariant that "threshold comparisons are total over
    /// finite numbers; NaN is treated as non-matching."
    #[must_use]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Bool(b) => {
                if b {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bool_checked_before_integer() {
        assert_eq!(MetricValue::from_json(&json!(true)), Some(MetricValue::Bool(true)));
        assert_eq!(MetricValue::from_json(&json!(false)), Some(MetricValue::Bool(false)));
    }

    #[test]
    fn integer_and_float() {
        assert_eq!(MetricValue::from_json(&json!(5)), Some(MetricValue::Int(5)));
        assert_eq!(MetricValue::from_json(&json!(-95)), Some(MetricValue::Int(-95)));
        assert_eq!(MetricValue::from_json(&json!(24.2)), Some(MetricValue::Float(24.2)));
    }

    #[test]
    fn string_and_null_dropped() {
        assert_eq!(MetricValue::from_json(&json!("A")), None);
        assert_eq!(MetricValue::from_json(&json!(null)), None);
    }

    #[test]
    fn array_and_object_dropped() {
        assert_eq!(MetricValue::from_json(&json!([1, 2])), None);
        assert_eq!(MetricValue::from_json(&json!({"a": 1})), None);
    }

    #[test]
    fn line_protocol_rendering() {
        assert_eq!(MetricValue::Bool(true).to_line_protocol(), "true");
        assert_eq!(MetricValue::Bool(false).to_line_protocol(), "false");
        assert_eq!(MetricValue::Int(-95).to_line_protocol(), "-95i");
        assert_eq!(MetricValue::Float(24.2).to_line_protocol(), "24.2");
    }

    #[test]
    fn nan_is_never_equal() {
        let nan = MetricValue::Float(f64::NAN).as_f64();
        assert!(!(nan > 0.0));
        assert!(!(nan < 0.0));
        assert!(!(nan >= 0.0));
        assert!(!(nan <= 0.0));
    }
}
