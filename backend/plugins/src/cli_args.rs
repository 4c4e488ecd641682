/// Candidate CLI options derived from CLI-bound properties.
///
/// Only lists the options; building and running the actual command belongs to
/// the plugin.
use serde::Serialize;
use serde_yaml::Value;
use tracing::{debug, info};

use opsforge_config::PropertyResolver;
use opsforge_config::value::{is_truthy, render};

/// Dash convention used when a property declares none.
pub const DEFAULT_DASH: &str = "--";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CliOption {
    /// Property the option came from.
    pub property: String,
    /// Flag including dashes, e.g. `--var-file`.
    pub flag: String,
    /// `None` for bare boolean flags.
    pub value: Option<String>,
}

impl CliOption {
    pub fn render(&self) -> String {
        match &self.value {
            Some(v) => format!("{}={}", self.flag, v),
            None => self.flag.clone(),
        }
    }
}

/// List the CLI options the resolved CLI-bound properties ask for, in order.
pub fn cli_options(properties: &[PropertyResolver]) -> Vec<CliOption> {
    info!("Generating CLI options");
    let mut options = Vec::new();
    for property in properties {
        let meta = &property.metadata;
        if meta.enabled == Some(false) {
            debug!(property = %property.name, "Disabled; skipping");
            continue;
        }
        let Some(parameter) = meta.parameter.as_deref().filter(|p| !p.is_empty()) else {
            continue;
        };
        let Some(value) = property.value.as_ref().filter(|v| is_truthy(v)) else {
            continue;
        };

        let dash = meta
            .dash_type
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or(DEFAULT_DASH);
        let value = match value {
            Value::Bool(true) => None,
            other => Some(render(other)),
        };
        options.push(CliOption {
            property: property.name.clone(),
            flag: format!("{dash}{parameter}"),
            value,
        });
    }
    options
}
