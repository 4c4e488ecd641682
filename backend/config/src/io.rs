//! Schema and config document loading.

use serde_yaml::{Mapping, Value};
use std::path::Path;
use tokio::fs;
use tracing::{debug, error, info};

use crate::error::{ResolveError, Result};

/// Load and parse a YAML document from disk.
///
/// A missing file is always an error; an empty file is an empty mapping.
pub async fn load_document(path: &Path) -> Result<Value> {
    if !fs::try_exists(path).await.unwrap_or(false) {
        error!(path = %path.display(), "Required file not found");
        return Err(ResolveError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let raw = fs::read_to_string(path)
        .await
        .map_err(|source| ResolveError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let doc = parse_document(&raw).map_err(|source| ResolveError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;

    info!(path = %path.display(), "Loaded document");
    Ok(doc)
}

/// Parse YAML text, mapping an empty document to an empty mapping.
pub fn parse_document(raw: &str) -> std::result::Result<Value, serde_yaml::Error> {
    if raw.trim().is_empty() {
        debug!("Empty document; using an empty mapping");
        return Ok(Value::Mapping(Mapping::new()));
    }
    match serde_yaml::from_str(raw)? {
        Value::Null => Ok(Value::Mapping(Mapping::new())),
        doc => Ok(doc),
    }
}
