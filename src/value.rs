//! Attribute values and the column-kind coercion policy.
//!
//! Every non-geometry cell in a dataset is one of these scalar values.
//! Filters arrive from the boundary layer as untyped JSON; coercion into the
//! column's declared kind happens here so operator code compares like with
//! like.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A scalar cell value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// The closed set of column kinds filters may coerce against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Integer,
    Float,
    Boolean,
    Text,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Renders the value as text for `contains` matching and fallback
    /// comparison. Null has no text form.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(b.to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Text(s) => Some(s.clone()),
        }
    }

    /// Ordinal comparison used by `greater_than` / `less_than`.
    ///
    /// Numbers compare numerically (integer and float interchange), text
    /// compares lexicographically. Booleans and nulls have no ordering.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Coerces an untyped JSON comparison value into `kind`.
///
/// Returns `None` when the value has no sensible rendering in that kind; the
/// caller treats that as zero matches rather than an error, which is what
/// arms the case-insensitive fallback pass.
pub fn coerce_json(raw: &serde_json::Value, kind: ColumnKind) -> Option<Value> {
    use serde_json::Value as Json;
    match kind {
        ColumnKind::Integer => match raw {
            Json::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                .map(Value::Int),
            Json::String(s) => s.trim().parse::<i64>().ok().map(Value::Int),
            _ => None,
        },
        ColumnKind::Float => match raw {
            Json::Number(n) => n.as_f64().map(Value::Float),
            Json::String(s) => s.trim().parse::<f64>().ok().map(Value::Float),
            _ => None,
        },
        ColumnKind::Boolean => match raw {
            Json::Bool(b) => Some(Value::Bool(*b)),
            Json::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            _ => None,
        },
        ColumnKind::Text => match raw {
            Json::String(s) => Some(Value::Text(s.clone())),
            Json::Bool(b) => Some(Value::Text(b.to_string())),
            Json::Number(n) => Some(Value::Text(n.to_string())),
            _ => None,
        },
    }
}

/// Renders a JSON comparison value as lowercase text for the fallback pass.
pub fn json_as_lower_text(raw: &serde_json::Value) -> Option<String> {
    use serde_json::Value as Json;
    match raw {
        Json::String(s) => Some(s.to_lowercase()),
        Json::Bool(b) => Some(b.to_string()),
        Json::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coercion_respects_column_kind() {
        assert_eq!(
            coerce_json(&json!("42"), ColumnKind::Integer),
            Some(Value::Int(42))
        );
        assert_eq!(
            coerce_json(&json!(42), ColumnKind::Float),
            Some(Value::Float(42.0))
        );
        assert_eq!(
            coerce_json(&json!("true"), ColumnKind::Boolean),
            Some(Value::Bool(true))
        );
        assert_eq!(coerce_json(&json!("abc"), ColumnKind::Integer), None);
        assert_eq!(coerce_json(&json!([1, 2]), ColumnKind::Text), None);
    }

    #[test]
    fn ordering_is_numeric_or_lexicographic() {
        assert_eq!(
            Value::Int(3).compare(&Value::Float(3.5)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::Text("b".into()).compare(&Value::Text("a".into())),
            Some(Ordering::Greater)
        );
        assert_eq!(Value::Bool(true).compare(&Value::Bool(false)), None);
        assert_eq!(Value::Null.compare(&Value::Int(1)), None);
    }
}
