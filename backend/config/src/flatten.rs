//! Schema path flattening.
//!
//! Walks the schema tree below a root key and lists every reachable key as a
//! dotted path, depth-first pre-order, in mapping insertion order.

use serde_yaml::{Mapping, Value};

use crate::error::{ResolveError, Result};
use crate::value::key_string;

/// Flatten every key reachable below `root_key`, including structural keys.
///
/// `root_key` itself is not part of the output.
pub fn flatten_paths(schema: &Value, root_key: &str) -> Result<Vec<String>> {
    let root = schema
        .as_mapping()
        .and_then(|map| map.get(root_key))
        .ok_or_else(|| {
            ResolveError::InvalidSchema(format!("root key '{root_key}' not found in schema"))
        })?;

    let mut paths = Vec::new();
    if let Value::Mapping(children) = root {
        collect(children, root_key, &mut paths);
    }
    Ok(paths)
}

fn collect(node: &Mapping, parent: &str, out: &mut Vec<String>) {
    for (key, child) in node {
        let path = format!("{parent}.{}", key_string(key));
        out.push(path.clone());
        // Non-mapping values are the natural leaf boundary.
        if let Value::Mapping(grandchildren) = child {
            collect(grandchildren, &path, out);
        }
    }
}
