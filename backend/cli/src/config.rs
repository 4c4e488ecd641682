use std::path::PathBuf;

use opsforge_config::ResolveSettings;
use opsforge_hooks::DEFAULT_INTERPRETER;

/// OpsForge runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Log level
    pub log_level: String,
    /// Directory for rolling JSON log files
    pub log_dir: Option<PathBuf>,
    /// Console logs as JSON
    pub log_json: bool,
    /// Interpreter used to run hook scripts
    pub hook_interpreter: String,
    /// Resolution settings before CLI flag overrides
    pub resolve: ResolveSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: None,
            log_json: false,
            hook_interpreter: DEFAULT_INTERPRETER.to_string(),
            resolve: ResolveSettings::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            log_level: lookup("OPSFORGE_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or_else(|| "info".to_string()),
            log_dir: lookup("OPSFORGE_LOG_DIR").map(PathBuf::from),
            log_json: lookup("OPSFORGE_LOG_JSON")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            hook_interpreter: lookup("OPSFORGE_HOOK_INTERPRETER")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_INTERPRETER.to_string()),
            resolve: ResolveSettings::from_lookup(&lookup),
        }
    }
}
