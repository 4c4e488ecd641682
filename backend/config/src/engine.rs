//! Config resolution engine: schema + config document → partitioned properties.
//!
//! One pass flattens the schema below its root key, drops schema scaffolding,
//! resolves a [`PropertyResolver`] per remaining path, partitions the results
//! into CLI-bound and options-bound lists, and fails closed when any required
//! property is left empty.

use serde::Serialize;
use serde_yaml::Value;
use tracing::{debug, error, info, warn};

use crate::coerce::TypeCoercer;
use crate::env::EnvExports;
use crate::error::{ResolveError, Result};
use crate::flatten::flatten_paths;
use crate::lookup::get_nested;
use crate::property::{PropertyResolver, Section, METADATA_FIELDS, PROPERTIES_SEGMENT};
use crate::settings::ResolveSettings;
use crate::value::key_string;

/// Literal config value marking a property as deliberately invalid.
pub const INVALID_VALUE_SENTINEL: &str = "BAD_CONFIG";

/// Final path segments that identify schema scaffolding rather than properties.
const STRUCTURAL_SEGMENTS: [&str; 4] = ["type", PROPERTIES_SEGMENT, "cli", "options"];

/// Output of one resolution pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolutionResult {
    pub root_key: String,
    pub cli_bound: Vec<PropertyResolver>,
    pub options_bound: Vec<PropertyResolver>,
    /// Properties whose value failed coercion or equals [`INVALID_VALUE_SENTINEL`].
    pub invalid: Vec<PropertyResolver>,
    /// Properties classified neither `cli` nor `options`.
    pub unclassified: Vec<PropertyResolver>,
    pub env: EnvExports,
}

impl ResolutionResult {
    /// Look up a resolved property by name across the CLI and options lists.
    pub fn get(&self, name: &str) -> Option<&PropertyResolver> {
        self.cli_bound
            .iter()
            .chain(&self.options_bound)
            .find(|p| p.name == name)
    }
}

/// Runs resolution passes with a fixed set of settings.
#[derive(Debug, Clone, Default)]
pub struct ConfigResolutionEngine {
    settings: ResolveSettings,
}

impl ConfigResolutionEngine {
    pub fn new(settings: ResolveSettings) -> Self {
        Self { settings }
    }

    /// Resolve `config` against `schema`.
    pub fn resolve(&self, schema: &Value, config: &Value) -> Result<ResolutionResult> {
        let root_key = root_key(schema)?;
        let paths = flatten_paths(schema, &root_key)?;
        debug!(root = %root_key, count = paths.len(), "Flattened schema paths");

        let property_paths = property_paths(paths, &root_key);
        for path in &property_paths {
            debug!(path = %path, "Schema property path");
        }

        let coercer = TypeCoercer::new(&self.settings);
        let mut result = ResolutionResult {
            root_key: root_key.clone(),
            ..Default::default()
        };

        for path in property_paths {
            let name = path.rsplit('.').next().unwrap_or(&path).to_string();
            let node = get_nested(schema, &path).value();
            let mut property = PropertyResolver::new(name, path, node, &self.settings)?;
            property.resolve(config, &coercer, &self.settings, &mut result.env)?;

            if property.invalid || is_sentinel(property.value.as_ref()) {
                result.invalid.push(property);
                continue;
            }
            match property.section() {
                Section::Cli => result.cli_bound.push(property),
                Section::Options => result.options_bound.push(property),
                Section::Other => result.unclassified.push(property),
            }
        }

        log_partition("CLI OPTIONS", &result.cli_bound);
        log_partition("PLUGIN OPTIONS", &result.options_bound);
        log_partition("BAD SCHEMA CONFIG", &result.invalid);

        check_required(&result)?;

        info!(
            root = %root_key,
            cli = result.cli_bound.len(),
            options = result.options_bound.len(),
            invalid = result.invalid.len(),
            exports = result.env.len(),
            "Resolved plugin configuration"
        );
        Ok(result)
    }
}

/// First top-level key of the schema; any further top-level keys are ignored.
fn root_key(schema: &Value) -> Result<String> {
    let map = schema
        .as_mapping()
        .ok_or_else(|| ResolveError::InvalidSchema("schema document is not a mapping".into()))?;
    let mut keys = map.keys();
    let first = keys
        .next()
        .ok_or_else(|| ResolveError::InvalidSchema("schema document is empty".into()))?;
    let ignored = keys.count();
    if ignored > 0 {
        debug!(ignored, "Schema has extra top-level keys; using the first only");
    }
    Ok(key_string(first))
}

/// Keep only paths naming a property, not schema scaffolding or metadata.
fn property_paths(paths: Vec<String>, root_key: &str) -> Vec<String> {
    paths
        .into_iter()
        .filter(|path| {
            let last = path.rsplit('.').next().unwrap_or(path);
            last != root_key
                && !STRUCTURAL_SEGMENTS.contains(&last)
                && !METADATA_FIELDS.contains(&last)
        })
        .collect()
}

fn is_sentinel(value: Option<&Value>) -> bool {
    value.and_then(Value::as_str) == Some(INVALID_VALUE_SENTINEL)
}

fn log_partition(title: &str, properties: &[PropertyResolver]) {
    debug!("~~~~~ {title} ~~~~~");
    for property in properties {
        debug!("{property}");
    }
}

/// Report every required property left empty, then fail the pass.
///
/// Invalid entries count too: their value is the default, which may be empty.
fn check_required(result: &ResolutionResult) -> Result<()> {
    let missing: Vec<&PropertyResolver> = result
        .cli_bound
        .iter()
        .chain(&result.options_bound)
        .chain(&result.unclassified)
        .chain(&result.invalid)
        .filter(|p| p.metadata.is_required() && !p.has_value())
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    warn!("~~~~~ REQUIRED CONFIG ~~~~~");
    for property in &missing {
        error!(
            property = %property.name,
            config_key = %property.config_key,
            "Configuration value is required; set it in the plugin config file"
        );
    }
    Err(ResolveError::RequiredValueMissing {
        properties: missing.iter().map(|p| p.name.clone()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{BoolCoercion, FalsyOverride};

    fn yaml(src: &str) -> Value {
        serde_yaml::from_str(src).unwrap()
    }

    fn engine() -> ConfigResolutionEngine {
        ConfigResolutionEngine::default()
    }

    const SCHEMA: &str = r#"
terraform:
  type: object
  cli:
    type: object
    properties:
      stack-action:
        type: string
        parameter: action
        default: plan
        export_env: TERRAFORM_COMMAND
      var-file:
        type: string
        parameter: var-file
  options:
    type: object
    properties:
      skip-deploy:
        type: boolean
        default: false
        export_env: SKIP_DEPLOY
      workspace:
        type: string
        default: default
      targets:
        type: list
        default: []
"#;

    #[test]
    fn name_defaults_into_cli_bound() {
        let schema = yaml("{root: {cli: {properties: {name: {type: string, default: app}}}}}");
        let result = engine().resolve(&schema, &yaml("{}")).unwrap();
        assert_eq!(result.cli_bound.len(), 1);
        assert_eq!(result.cli_bound[0].name, "name");
        assert_eq!(result.cli_bound[0].value, Some(Value::from("app")));
        assert!(result.options_bound.is_empty());
    }

    #[test]
    fn name_override_is_used() {
        let schema = yaml("{root: {cli: {properties: {name: {type: string, default: app}}}}}");
        let config = yaml("{root: {cli: {name: custom}}}");
        let result = engine().resolve(&schema, &config).unwrap();
        assert_eq!(result.cli_bound[0].value, Some(Value::from("custom")));
    }

    #[test]
    fn partitions_cli_and_options() {
        let config = yaml(
            r#"
terraform:
  cli:
    stack-action: apply
  options:
    workspace: prod
    targets: [a, b]
"#,
        );
        let result = engine().resolve(&yaml(SCHEMA), &config).unwrap();

        let cli: Vec<_> = result.cli_bound.iter().map(|p| p.name.as_str()).collect();
        let options: Vec<_> = result.options_bound.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(cli, vec!["stack-action", "var-file"]);
        assert_eq!(options, vec!["skip-deploy", "workspace", "targets"]);

        assert_eq!(result.get("stack-action").unwrap().value, Some(Value::from("apply")));
        assert_eq!(result.get("var-file").unwrap().value, None);
        assert_eq!(result.get("workspace").unwrap().value, Some(Value::from("prod")));
        assert_eq!(result.get("targets").unwrap().value, Some(yaml("[a, b]")));
        assert_eq!(result.env.get("OPSFORGE_TERRAFORM_COMMAND"), Some("apply"));
        // `false` renders to a non-empty string and is exported.
        assert_eq!(result.env.get("OPSFORGE_SKIP_DEPLOY"), Some("false"));
    }

    #[test]
    fn partition_is_mutually_exclusive() {
        let schema = yaml(
            r#"
root:
  cli:
    properties:
      a: {type: string, default: x}
  options:
    properties:
      b: {type: string, default: y}
  extra:
    properties:
      c: {type: string, default: z}
"#,
        );
        let result = engine().resolve(&schema, &yaml("{}")).unwrap();
        let in_cli = |n: &str| result.cli_bound.iter().any(|p| p.name == n);
        let in_opts = |n: &str| result.options_bound.iter().any(|p| p.name == n);
        assert!(in_cli("a") && !in_opts("a"));
        assert!(in_opts("b") && !in_cli("b"));
        // `extra` is the second segment; `c` lands in neither list.
        assert!(!in_cli("c") && !in_opts("c"));
        assert!(result.unclassified.iter().any(|p| p.name == "c"));
        assert!(result.unclassified.iter().any(|p| p.name == "extra"));
    }

    #[test]
    fn structural_nodes_stay_empty() {
        let schema = yaml(
            r#"
root:
  options:
    properties:
      group:
        type: object
        properties:
          leaf: {type: int, default: 3}
"#,
        );
        let config = yaml("{root: {options: {group: {leaf: '9'}}}}");
        let result = engine().resolve(&schema, &config).unwrap();
        let group = result.get("group").unwrap();
        assert!(group.metadata.is_structural());
        assert_eq!(group.value, None);
        assert_eq!(result.get("leaf").unwrap().value, Some(yaml("9")));
    }

    #[test]
    fn required_missing_reports_every_property() {
        let schema = yaml(
            r#"
root:
  cli:
    properties:
      token: {type: string, required: true, default: ""}
      ok: {type: string, required: true, default: fine}
  options:
    properties:
      region: {type: string, required: true}
"#,
        );
        let err = engine().resolve(&schema, &yaml("{}")).unwrap_err();
        match err {
            ResolveError::RequiredValueMissing { properties } => {
                assert_eq!(properties, vec!["token", "region"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn required_missing_is_fatal_even_when_lenient() {
        let schema = yaml("{root: {cli: {properties: {name: {type: string, required: true, default: ''}}}}}");
        let err = ConfigResolutionEngine::new(ResolveSettings::default())
            .resolve(&schema, &yaml("{}"))
            .unwrap_err();
        assert!(err.is_required_missing());
    }

    #[test]
    fn required_satisfied_by_override() {
        let schema = yaml("{root: {cli: {properties: {name: {type: string, required: true, default: ''}}}}}");
        let result = engine()
            .resolve(&schema, &yaml("{root: {cli: {name: set}}}"))
            .unwrap();
        assert_eq!(result.cli_bound[0].value, Some(Value::from("set")));
    }

    #[test]
    fn invalid_values_are_tracked_separately() {
        let schema = yaml(
            r#"
root:
  cli:
    properties:
      count: {type: int, default: 1}
      mode: {type: string, default: fast}
"#,
        );
        let config = yaml("{root: {cli: {count: many, mode: BAD_CONFIG}}}");
        let result = engine().resolve(&schema, &config).unwrap();
        let invalid: Vec<_> = result.invalid.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(invalid, vec!["count", "mode"]);
        assert!(result.cli_bound.is_empty());
        assert_eq!(result.invalid[0].value, Some(yaml("1")));
    }

    #[test]
    fn required_with_unconvertible_value_is_fatal() {
        let schema = yaml("{root: {cli: {properties: {count: {type: int, required: true, default: 0}}}}}");
        let err = engine()
            .resolve(&schema, &yaml("{root: {cli: {count: lots}}}"))
            .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::RequiredValueMissing { ref properties } if properties == &["count"]
        ));
    }

    #[test]
    fn required_with_unconvertible_value_keeps_usable_default() {
        let schema = yaml("{root: {cli: {properties: {count: {type: int, required: true, default: 5}}}}}");
        let result = engine()
            .resolve(&schema, &yaml("{root: {cli: {count: lots}}}"))
            .unwrap();
        assert_eq!(result.invalid[0].value, Some(yaml("5")));
    }

    #[test]
    fn fail_fast_escalates_missing_metadata() {
        let schema = yaml("{root: {cli: {properties: {name: {type: string}}}}}");
        let err = ConfigResolutionEngine::new(ResolveSettings::default().with_fail_fast(true))
            .resolve(&schema, &yaml("{}"))
            .unwrap_err();
        assert!(matches!(err, ResolveError::MissingMetadataField { .. }));
    }

    #[test]
    fn unsupported_type_uses_default_when_lenient() {
        let schema = yaml("{root: {cli: {properties: {ratio: {type: float, default: '0.5'}}}}}");
        let result = engine()
            .resolve(&schema, &yaml("{root: {cli: {ratio: 0.9}}}"))
            .unwrap();
        assert_eq!(result.cli_bound[0].value, Some(Value::from("0.5")));
    }

    #[test]
    fn boolean_string_quirk_and_strict_fix() {
        let schema = yaml("{root: {options: {properties: {flag: {type: boolean, default: false}}}}}");
        let config = yaml("{root: {options: {flag: 'false'}}}");

        let truthy = engine().resolve(&schema, &config).unwrap();
        assert_eq!(truthy.options_bound[0].value, Some(Value::Bool(true)));

        let strict = ConfigResolutionEngine::new(
            ResolveSettings::default()
                .with_bool_coercion(BoolCoercion::Strict)
                .with_falsy_override(FalsyOverride::Keep),
        )
        .resolve(&schema, &config)
        .unwrap();
        assert_eq!(strict.options_bound[0].value, Some(Value::Bool(false)));
    }

    #[test]
    fn only_first_top_level_key_is_used() {
        let schema = yaml(
            r#"
first:
  cli:
    properties:
      a: {type: string, default: x}
second:
  cli:
    properties:
      b: {type: string, default: y}
"#,
        );
        let result = engine().resolve(&schema, &yaml("{}")).unwrap();
        assert_eq!(result.root_key, "first");
        assert_eq!(result.cli_bound.len(), 1);
        assert_eq!(result.cli_bound[0].name, "a");
    }

    #[test]
    fn empty_schema_is_invalid() {
        let err = engine().resolve(&yaml("{}"), &yaml("{}")).unwrap_err();
        assert!(matches!(err, ResolveError::InvalidSchema(_)));
    }

    #[test]
    fn resolution_is_repeatable() {
        let schema = yaml(SCHEMA);
        let a = engine().resolve(&schema, &yaml("{}")).unwrap();
        let b = engine().resolve(&schema, &yaml("{}")).unwrap();
        let names = |r: &ResolutionResult| {
            r.cli_bound
                .iter()
                .chain(&r.options_bound)
                .map(|p| p.schema_key.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(names(&a), names(&b));
        assert_eq!(a.env, b.env);
    }
}
