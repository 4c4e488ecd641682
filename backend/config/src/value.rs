//! Helpers over `serde_yaml::Value` shared by the resolver stages.

use serde_yaml::Value;

/// Render a value the way it is shown in logs, `string` coercion and env exports.
///
/// Strings are verbatim, numbers decimal, booleans `true`/`false`, null empty,
/// sequences and mappings compact JSON.
pub fn render(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Tagged(tagged) => render(&tagged.value),
        compound => serde_json::to_string(compound).unwrap_or_default(),
    }
}

/// Truthiness: null, `false`, zero, empty strings and empty collections are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i != 0
            } else if let Some(u) = n.as_u64() {
                u != 0
            } else {
                n.as_f64().map(|f| f != 0.0).unwrap_or(false)
            }
        }
        Value::String(s) => !s.is_empty(),
        Value::Sequence(seq) => !seq.is_empty(),
        Value::Mapping(map) => !map.is_empty(),
        Value::Tagged(tagged) => is_truthy(&tagged.value),
    }
}

/// Mapping keys are usually strings; anything else is rendered.
pub fn key_string(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => render(other),
    }
}
