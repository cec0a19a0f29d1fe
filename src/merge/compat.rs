//! Type checks shared by the merge policies.

use serde_json::Value;

/// Returns `true` when two leaves have the same JSON type.
///
/// All numbers are compatible with each other regardless of whether they
/// were written as integers or floats. Incompatible leaves never block a
/// merge; the check only feeds diagnostics.
#[must_use]
pub fn is_compatible(base: &Value, external: &Value) -> bool {
    matches!(
        (base, external),
        (Value::Number(_), Value::Number(_))
            | (Value::String(_), Value::String(_))
            | (Value::Bool(_), Value::Bool(_))
            | (Value::Null, Value::Null)
            | (Value::Array(_), Value::Array(_))
            | (Value::Object(_), Value::Object(_))
    )
}

/// Returns `true` when every leaf of `value` is `null`.
///
/// Empty objects and arrays are not considered all-null, but a bare `null`
/// is.
#[must_use]
pub fn is_all_null(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => !map.is_empty() && map.values().all(is_all_null),
        Value::Array(items) => !items.is_empty() && items.iter().all(is_all_null),
        _ => false,
    }
}

/// Name of the JSON type of `value`, for diagnostics.
#[must_use]
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
