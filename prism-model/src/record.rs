use serde_json::Value;

/// A flat or nested JSON object whose keys keep insertion order.
///
/// Used for crosswalk rows, raw source rows, intermediates and output rows.
pub type Record = serde_json::Map<String, Value>;

/// Field holding an identity's stable unique key in the crosswalk.
pub const IDENTITY_KEY: &str = "prism_id";

/// Slot of an intermediate that holds the identity's crosswalk row.
/// No source may use this name.
pub const CROSSWALK_SLOT: &str = "crosswalk";

/// Returns true for `null`, `false`, zero, `""`, `[]` and `{}`.
///
/// A fallback skips these and a pivot files them under its `null_key`.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Converts a value into an exact-match lookup key.
///
/// Strings are used verbatim and numbers by their decimal text. Every other
/// value (including the empty string) has no key.
pub fn lookup_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
