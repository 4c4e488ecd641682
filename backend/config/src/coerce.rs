//! Type coercion of raw config values to a property's declared type.

use serde::{Deserialize, Serialize};
use serde_yaml::{Number, Value};
use tracing::warn;

use crate::error::{ResolveError, Result};
use crate::settings::{BoolCoercion, ResolveSettings};
use crate::value::{is_truthy, key_string, render};

/// Semantic type of a schema property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    /// Structural grouping node; never carries a value.
    Object,
    String,
    Int,
    Boolean,
    List,
}

impl PropertyType {
    /// Parse a schema `type` tag.
    ///
    /// `object` must match exactly; the rest match by case-insensitive substring,
    /// checked in the order `list`, `string`, `int`, `bool`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let lower = tag.trim().to_ascii_lowercase();
        if lower == "object" {
            Some(Self::Object)
        } else if lower.contains("list") {
            Some(Self::List)
        } else if lower.contains("string") {
            Some(Self::String)
        } else if lower.contains("int") {
            Some(Self::Int)
        } else if lower.contains("bool") {
            Some(Self::Boolean)
        } else {
            None
        }
    }
}

/// Converts raw values according to a type tag and the pass settings.
#[derive(Debug, Clone)]
pub struct TypeCoercer {
    fail_fast: bool,
    bool_coercion: BoolCoercion,
}

impl TypeCoercer {
    pub fn new(settings: &ResolveSettings) -> Self {
        Self {
            fail_fast: settings.fail_fast,
            bool_coercion: settings.bool_coercion,
        }
    }

    /// Coerce `raw` for `property` to the type named by `type_tag`.
    ///
    /// `Ok(None)` means "no value": structural type, absent raw value, or an
    /// unsupported tag in lenient mode. A present value that cannot be
    /// converted is always an error; the caller decides whether it is fatal.
    pub fn coerce(
        &self,
        property: &str,
        type_tag: Option<&str>,
        raw: Option<&Value>,
    ) -> Result<Option<Value>> {
        let Some(raw) = raw.filter(|v| !v.is_null()) else {
            return Ok(None);
        };

        let tag = type_tag.unwrap_or_default();
        let Some(kind) = PropertyType::from_tag(tag) else {
            if self.fail_fast {
                return Err(ResolveError::UnsupportedTypeTag {
                    property: property.to_string(),
                    type_tag: tag.to_string(),
                });
            }
            warn!(property, type_tag = tag, "Data type not supported");
            return Ok(None);
        };

        let coerced = match kind {
            PropertyType::Object => return Ok(None),
            PropertyType::List => to_list(raw),
            PropertyType::String => Some(Value::String(render(raw))),
            PropertyType::Int => to_int(raw),
            PropertyType::Boolean => self.to_bool(raw),
        };

        coerced.map(Some).ok_or_else(|| ResolveError::CoercionFailed {
            property: property.to_string(),
            type_tag: tag.to_string(),
            value: render(raw),
        })
    }

    fn to_bool(&self, raw: &Value) -> Option<Value> {
        match (self.bool_coercion, raw) {
            (BoolCoercion::Strict, Value::String(s)) => {
                match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "yes" | "on" | "1" => Some(Value::Bool(true)),
                    "false" | "no" | "off" | "0" | "" => Some(Value::Bool(false)),
                    _ => None,
                }
            }
            _ => Some(Value::Bool(is_truthy(raw))),
        }
    }
}

fn to_list(raw: &Value) -> Option<Value> {
    match raw {
        Value::Sequence(seq) => Some(Value::Sequence(seq.clone())),
        Value::String(s) => Some(Value::Sequence(
            s.chars().map(|c| Value::String(c.to_string())).collect(),
        )),
        Value::Mapping(map) => Some(Value::Sequence(
            map.keys().map(|k| Value::String(key_string(k))).collect(),
        )),
        Value::Tagged(tagged) => to_list(&tagged.value),
        _ => None,
    }
}

fn to_int(raw: &Value) -> Option<Value> {
    let int = match raw {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Number::from(i)
            } else if let Some(u) = n.as_u64() {
                Number::from(u)
            } else {
                Number::from(float_to_i64(n.as_f64()?)?)
            }
        }
        Value::Bool(b) => Number::from(i64::from(*b)),
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(i) => Number::from(i),
                Err(_) => Number::from(s.parse::<u64>().ok()?),
            }
        }
        Value::Tagged(tagged) => return to_int(&tagged.value),
        _ => return None,
    };
    Some(Value::Number(int))
}

/// Truncate toward zero; `None` when the result would not fit an `i64`.
fn float_to_i64(f: f64) -> Option<i64> {
    let t = f.trunc();
    // i64::MAX as f64 rounds up to 2^63, hence the strict upper bound.
    (t.is_finite() && t >= i64::MIN as f64 && t < i64::MAX as f64).then_some(t as i64)
}
