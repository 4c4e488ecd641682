//! Nested key lookup by dotted path.

use serde_yaml::Value;
use tracing::debug;

/// Outcome of a nested lookup. A present falsy value is still `Found`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup<'a> {
    Found(&'a Value),
    NotFound,
}

impl<'a> Lookup<'a> {
    pub fn value(self) -> Option<&'a Value> {
        match self {
            Lookup::Found(v) => Some(v),
            Lookup::NotFound => None,
        }
    }
}

/// Extract a value from `root` by dotted path (e.g. `"terraform.cli.stack-action"`).
///
/// Missing keys, non-mapping intermediates and a null document all yield `NotFound`.
pub fn get_nested<'a>(root: &'a Value, key: &str) -> Lookup<'a> {
    let mut current = root;
    for part in key.split('.') {
        match current.as_mapping().and_then(|map| map.get(part)) {
            Some(next) => current = next,
            None => {
                debug!(key, missing = part, "Key not found");
                return Lookup::NotFound;
            }
        }
    }
    Lookup::Found(current)
}
