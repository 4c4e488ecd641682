/// Plugin directory layout: where the schema, config and hook scripts live.
use std::path::PathBuf;

use opsforge_hooks::HookPhase;

/// Schema file name inside a plugin directory.
pub const SCHEMA_FILE: &str = "plugin.schema.yaml";
/// Config file name inside a plugin directory.
pub const CONFIG_FILE: &str = "plugin.config.yaml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginLayout {
    root: PathBuf,
    config_override: Option<PathBuf>,
}

impl PluginLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), config_override: None }
    }

    /// Read the plugin config from `path` instead of the plugin directory.
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_override = Some(path.into());
        self
    }

    /// Plugin name: the directory's final component.
    pub fn name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.root.display().to_string())
    }

    pub fn schema_path(&self) -> PathBuf {
        self.root.join(SCHEMA_FILE)
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_override
            .clone()
            .unwrap_or_else(|| self.root.join(CONFIG_FILE))
    }

    pub fn hooks_dir(&self, phase: HookPhase) -> PathBuf {
        self.root.join(phase.dir_name())
    }
}
