//! Environment exports produced by a resolution pass.
//!
//! The engine only records `NAME → value` pairs. Hook processes receive them
//! as their environment; a shell picks them up through `to_shell_exports`.

use serde::Serialize;
use serde_yaml::Value;
use std::collections::BTreeMap;
use tracing::info;

use crate::redact::redact_for;
use crate::value::render;

/// Ordered map of exported environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EnvExports {
    vars: BTreeMap<String, String>,
}

impl EnvExports {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `prefix + export_env` for a resolved value.
    ///
    /// Skipped when the export name is empty, or the value is absent, renders
    /// empty, or is the literal `None`.
    pub fn export(&mut self, prefix: &str, export_env: &str, value: Option<&Value>) -> bool {
        if export_env.is_empty() {
            return false;
        }
        let Some(rendered) = value.map(render) else {
            return false;
        };
        if rendered.is_empty() || rendered == "None" {
            return false;
        }

        let name = format!("{prefix}{export_env}");
        info!(
            name = %name,
            value = %redact_for([export_env], &rendered),
            "Setting environment variable"
        );
        self.vars.insert(name, rendered);
        true
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Merge another pass's exports; entries from `other` win.
    pub fn merge(&mut self, other: &EnvExports) {
        for (k, v) in other.iter() {
            self.vars.insert(k.to_string(), v.to_string());
        }
    }

    /// `export NAME='value'` lines for shell consumption.
    pub fn to_shell_exports(&self) -> String {
        self.vars
            .iter()
            .map(|(k, v)| format!("export {k}='{}'\n", v.replace('\'', r"'\''")))
            .collect()
    }
}
