//! Schema properties: declared metadata plus the value resolved from config.

use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::fmt;
use tracing::{debug, info, warn};

use crate::coerce::{PropertyType, TypeCoercer};
use crate::env::EnvExports;
use crate::error::{ResolveError, Result};
use crate::lookup::get_nested;
use crate::redact::redact_for;
use crate::settings::{FalsyOverride, ResolveSettings};
use crate::value::{is_truthy, render};

/// Metadata field names in declaration order.
pub const METADATA_FIELDS: [&str; 7] = [
    "export_env",
    "default",
    "enabled",
    "type",
    "parameter",
    "required",
    "dash_type",
];

/// Schema-structure segment that never appears in config data paths.
pub const PROPERTIES_SEGMENT: &str = "properties";

/// Declared shape of one schema node.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PropertyMetadata {
    pub export_env: Option<String>,
    pub default: Option<Value>,
    pub enabled: Option<bool>,
    #[serde(rename = "type")]
    pub type_tag: Option<String>,
    pub parameter: Option<String>,
    pub required: Option<bool>,
    pub dash_type: Option<String>,
}

impl PropertyMetadata {
    /// Metadata for a node whose schema subtree is not a mapping.
    pub fn structural() -> Self {
        Self {
            type_tag: Some("object".to_string()),
            ..Default::default()
        }
    }

    /// Read each known field from `map`.
    ///
    /// Absent fields stay `None`; with `fail_fast` the first absent field is an error.
    pub fn from_mapping(property: &str, map: &Mapping, fail_fast: bool) -> Result<Self> {
        let get = |field| lookup_field(property, map, field, fail_fast);
        Ok(Self {
            export_env: get("export_env")?.and_then(as_text),
            default: get("default")?.cloned(),
            enabled: get("enabled")?.and_then(|v| as_flag(property, "enabled", v)),
            type_tag: get("type")?.and_then(as_text),
            parameter: get("parameter")?.and_then(as_text),
            required: get("required")?.and_then(|v| as_flag(property, "required", v)),
            dash_type: get("dash_type")?.and_then(as_text),
        })
    }

    pub fn property_type(&self) -> Option<PropertyType> {
        self.type_tag.as_deref().and_then(PropertyType::from_tag)
    }

    pub fn is_structural(&self) -> bool {
        self.property_type() == Some(PropertyType::Object)
    }

    pub fn is_required(&self) -> bool {
        self.required == Some(true)
    }
}

fn lookup_field<'m>(
    property: &str,
    map: &'m Mapping,
    field: &'static str,
    fail_fast: bool,
) -> Result<Option<&'m Value>> {
    match map.get(field) {
        Some(raw) => Ok(Some(raw)),
        None if fail_fast => Err(ResolveError::MissingMetadataField {
            property: property.to_string(),
            field,
        }),
        None => {
            warn!(property, field, "Schema property missing metadata field");
            Ok(None)
        }
    }
}

fn as_text(raw: &Value) -> Option<String> {
    match raw {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(render(other)),
    }
}

fn as_flag(property: &str, field: &str, raw: &Value) -> Option<bool> {
    match raw {
        Value::Null => None,
        Value::Bool(b) => Some(*b),
        other => {
            warn!(property, field, value = %render(other), "Expected a boolean; ignoring");
            None
        }
    }
}

/// Classifier derived from the second segment of the config key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Cli,
    Options,
    Other,
}

/// One schema node and, after [`PropertyResolver::resolve`], its effective value.
#[derive(Debug, Clone, Serialize)]
pub struct PropertyResolver {
    pub name: String,
    pub schema_key: String,
    pub config_key: String,
    pub schema_property_type: Option<String>,
    pub metadata: PropertyMetadata,
    pub value: Option<Value>,
    /// Set when a present config value could not be coerced.
    pub invalid: bool,
}

impl PropertyResolver {
    /// Build a resolver from the schema subtree found at `schema_key`.
    pub fn new(
        name: impl Into<String>,
        schema_key: impl Into<String>,
        schema_node: Option<&Value>,
        settings: &ResolveSettings,
    ) -> Result<Self> {
        let name = name.into();
        let schema_key = schema_key.into();
        let config_key = config_key_for(&schema_key);
        let schema_property_type = config_key.split('.').nth(1).map(str::to_string);

        let metadata = match schema_node {
            Some(Value::Mapping(map)) if !map.is_empty() => {
                PropertyMetadata::from_mapping(&schema_key, map, settings.fail_fast)?
            }
            _ => PropertyMetadata::structural(),
        };

        let resolver = Self {
            name,
            schema_key,
            config_key,
            schema_property_type,
            metadata,
            value: None,
            invalid: false,
        };
        debug!("New schema property:{resolver}");
        Ok(resolver)
    }

    pub fn section(&self) -> Section {
        match self.schema_property_type.as_deref() {
            Some("cli") => Section::Cli,
            Some("options") => Section::Options,
            _ => Section::Other,
        }
    }

    /// Resolve the effective value against `config` and record env exports.
    pub fn resolve(
        &mut self,
        config: &Value,
        coercer: &TypeCoercer,
        settings: &ResolveSettings,
        exports: &mut EnvExports,
    ) -> Result<()> {
        if self.metadata.is_structural() {
            return Ok(());
        }

        let found = get_nested(config, &self.config_key).value();
        debug!(
            config_key = %self.config_key,
            found = found.is_some(),
            "Searching config"
        );

        let coerced = match coercer.coerce(
            &self.schema_key,
            self.metadata.type_tag.as_deref(),
            found,
        ) {
            Ok(v) => v,
            Err(err @ ResolveError::CoercionFailed { .. }) if !settings.fail_fast => {
                warn!(property = %self.name, error = %err, "Invalid config value; using default");
                self.invalid = true;
                None
            }
            Err(err) => return Err(err),
        };

        let usable = coerced.filter(|v| match settings.falsy_override {
            FalsyOverride::FallBackToDefault => is_truthy(v),
            FalsyOverride::Keep => true,
        });

        match usable {
            Some(v) => {
                info!(
                    property = %self.name,
                    default = %self.display_value(self.metadata.default.as_ref()),
                    value = %self.display_value(Some(&v)),
                    "Override found"
                );
                self.value = Some(v);
            }
            None => self.value = self.metadata.default.clone(),
        }

        if let Some(export_env) = self.metadata.export_env.as_deref() {
            exports.export(&settings.env_prefix, export_env, self.value.as_ref());
        }
        Ok(())
    }

    /// Whether the resolved value counts as set for `required` checks.
    pub fn has_value(&self) -> bool {
        self.value.as_ref().map(is_truthy).unwrap_or(false)
    }

    /// Value rendered for logs, masked when the property looks sensitive.
    fn display_value(&self, value: Option<&Value>) -> String {
        let rendered = value.map(render).unwrap_or_default();
        let names = [Some(self.name.as_str()), self.metadata.export_env.as_deref()];
        redact_for(names.into_iter().flatten(), &rendered)
    }
}

impl fmt::Display for PropertyResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let opt = |v: &Option<String>| v.clone().unwrap_or_default();
        let flag = |v: Option<bool>| v.map(|b| b.to_string()).unwrap_or_default();
        write!(
            f,
            "\n\tName:         [{}]\
             \n\tSchema Key:   [{}]\
             \n\tConfig Key:   [{}]\
             \n\tSchema Type:  [{}]\
             \n\tExport Env:   [{}]\
             \n\tDefault:      [{}]\
             \n\tEnabled:      [{}]\
             \n\tType:         [{}]\
             \n\tParameter:    [{}]\
             \n\tDash Type:    [{}]\
             \n\tRequired:     [{}]\
             \n\tValue Set:    [{}]",
            self.name,
            self.schema_key,
            self.config_key,
            opt(&self.schema_property_type),
            opt(&self.metadata.export_env),
            self.display_value(self.metadata.default.as_ref()),
            flag(self.metadata.enabled),
            opt(&self.metadata.type_tag),
            opt(&self.metadata.parameter),
            opt(&self.metadata.dash_type),
            flag(self.metadata.required),
            self.display_value(self.value.as_ref()),
        )
    }
}

/// Drop every `properties` segment: it structures the schema, not the config.
pub fn config_key_for(schema_key: &str) -> String {
    schema_key
        .split('.')
        .filter(|segment| *segment != PROPERTIES_SEGMENT)
        .collect::<Vec<_>>()
        .join(".")
}
