//! Error types for schema resolution.

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can stop or degrade a resolution pass.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A schema leaf does not declare one of the known metadata fields.
    #[error("schema property '{property}' is missing metadata field '{field}'")]
    MissingMetadataField { property: String, field: &'static str },

    /// The declared `type` is not one the coercer understands.
    #[error("data type not supported: [{type_tag}] (property '{property}')")]
    UnsupportedTypeTag { property: String, type_tag: String },

    /// A value was found but cannot be converted to the declared type.
    #[error("cannot coerce value [{value}] of '{property}' to type [{type_tag}]")]
    CoercionFailed {
        property: String,
        type_tag: String,
        value: String,
    },

    /// One or more required properties resolved to an empty value.
    #[error("required configuration values are missing: {}", .properties.join(", "))]
    RequiredValueMissing { properties: Vec<String> },

    /// Schema or config document does not exist.
    #[error("required file not found: [{}]", .path.display())]
    FileNotFound { path: PathBuf },

    /// The schema has no usable root key.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML at {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl ResolveError {
    /// Missing required values are always fatal; callers use this to pick an exit path.
    pub fn is_required_missing(&self) -> bool {
        matches!(self, Self::RequiredValueMissing { .. })
    }
}

/// Convenience alias for results with [`ResolveError`].
pub type Result<T> = std::result::Result<T, ResolveError>;
