/// Hook lifecycle phases and per-script outcomes.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Hook phases
// ---------------------------------------------------------------------------

/// The deploy phase at which a hook directory runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookPhase {
    /// Before the plugin's configuration is resolved and deployed.
    BeforeDeploy,
    /// After the plugin has been deployed.
    AfterDeploy,
}

impl HookPhase {
    pub fn label(&self) -> &'static str {
        match self {
            Self::BeforeDeploy => "before-deploy",
            Self::AfterDeploy => "after-deploy",
        }
    }

    /// Directory name holding this phase's scripts inside a plugin.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::BeforeDeploy => "before-deploy.d",
            Self::AfterDeploy => "after-deploy.d",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "before-deploy" | "before" => Some(Self::BeforeDeploy),
            "after-deploy" | "after" => Some(Self::AfterDeploy),
            _ => None,
        }
    }
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Result of running one hook script.
#[derive(Debug, Clone, Serialize)]
pub struct HookOutcome {
    /// File name of the script within the hooks directory.
    pub script: String,
    /// Exit code; `None` if the process was killed by a signal or never spawned.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub started_at: DateTime<Utc>,
    #[serde(with = "duration_millis")]
    pub duration: Duration,
}

impl HookOutcome {
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Everything that ran for one hooks directory.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HookReport {
    pub mode: String,
    pub outcomes: Vec<HookOutcome>,
}

impl HookReport {
    pub fn new(mode: impl Into<String>) -> Self {
        Self { mode: mode.into(), outcomes: Vec::new() }
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(HookOutcome::succeeded)
    }

    pub fn failures(&self) -> impl Iterator<Item = &HookOutcome> {
        self.outcomes.iter().filter(|o| !o.succeeded())
    }

    pub fn scripts(&self) -> Vec<&str> {
        self.outcomes.iter().map(|o| o.script.as_str()).collect()
    }
}

mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }
}
