//! `opsforge-config` — schema-driven plugin configuration resolution.
//!
//! Provides:
//! - Schema path flattening and nested key lookup
//! - Type coercion with configurable boolean parsing
//! - Per-property resolution against a plugin config document
//! - Required-value validation and CLI/options partitioning
//! - Environment exports as an explicit, auditable map
//! - Redaction of sensitive values in log output

pub mod coerce;
pub mod engine;
pub mod env;
pub mod error;
pub mod flatten;
pub mod io;
pub mod lookup;
pub mod property;
pub mod redact;
pub mod settings;
pub mod value;

// Re-export most-used types at crate root.
pub use coerce::{PropertyType, TypeCoercer};
pub use engine::{ConfigResolutionEngine, ResolutionResult, INVALID_VALUE_SENTINEL};
pub use env::EnvExports;
pub use error::{ResolveError, Result};
pub use flatten::flatten_paths;
pub use io::{load_document, parse_document};
pub use lookup::{get_nested, Lookup};
pub use property::{PropertyMetadata, PropertyResolver, Section, METADATA_FIELDS};
pub use settings::{BoolCoercion, FalsyOverride, ResolveSettings, DEFAULT_ENV_PREFIX};

use std::path::Path;
use tracing::info;

/// Load both documents from disk and run one resolution pass.
///
/// This is the main entry point for resolving a plugin at runtime.
pub async fn resolve_files(
    schema_path: &Path,
    config_path: &Path,
    settings: &ResolveSettings,
) -> Result<ResolutionResult> {
    info!(
        config = %config_path.display(),
        schema = %schema_path.display(),
        "Resolving plugin configuration"
    );
    let schema = load_document(schema_path).await?;
    let config = load_document(config_path).await?;
    ConfigResolutionEngine::new(settings.clone()).resolve(&schema, &config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let schema = dir.path().join("plugin.schema.yaml");
        let config = dir.path().join("plugin.config.yaml");
        std::fs::write(
            &schema,
            "root:\n  cli:\n    properties:\n      name:\n        type: string\n        default: app\n",
        )
        .unwrap();
        std::fs::write(&config, "root:\n  cli:\n    name: custom\n").unwrap();

        let result = resolve_files(&schema, &config, &ResolveSettings::default())
            .await
            .unwrap();
        assert_eq!(result.cli_bound[0].value.as_ref().and_then(|v| v.as_str()), Some("custom"));
    }

    #[tokio::test]
    async fn missing_config_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let schema = dir.path().join("plugin.schema.yaml");
        std::fs::write(&schema, "root: {}\n").unwrap();
        let err = resolve_files(&schema, &dir.path().join("missing.yaml"), &ResolveSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::FileNotFound { .. }));
    }
}
