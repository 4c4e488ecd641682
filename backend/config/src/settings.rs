//! Resolution settings threaded through every component of a pass.

use serde::{Deserialize, Serialize};

/// Default prefix for exported environment variables.
pub const DEFAULT_ENV_PREFIX: &str = "OPSFORGE_";

/// How string values are converted for `boolean` properties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoolCoercion {
    /// Truthiness: every non-empty string is `true`, including `"false"`.
    #[default]
    Truthy,
    /// Parse `true/yes/on/1` and `false/no/off/0`; anything else is a coercion failure.
    Strict,
}

/// What happens when a config override coerces to a falsy value (`0`, `false`, `""`, `[]`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FalsyOverride {
    /// Treat it like a missing key and use the declared default.
    #[default]
    FallBackToDefault,
    /// Keep the explicit override.
    Keep,
}

/// Settings for one resolution pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveSettings {
    /// Escalate missing metadata, unsupported types and bad values to errors.
    pub fail_fast: bool,
    pub bool_coercion: BoolCoercion,
    pub falsy_override: FalsyOverride,
    pub env_prefix: String,
}

impl Default for ResolveSettings {
    fn default() -> Self {
        Self {
            fail_fast: false,
            bool_coercion: BoolCoercion::default(),
            falsy_override: FalsyOverride::default(),
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
        }
    }
}

impl ResolveSettings {
    /// Load settings from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ResolveSettings::from_env`] but reads through `lookup` (useful for testing).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            fail_fast: lookup("OPSFORGE_FAST_FAIL")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.fail_fast),
            bool_coercion: match lookup("OPSFORGE_BOOL_COERCION").as_deref() {
                Some(v) if v.eq_ignore_ascii_case("strict") => BoolCoercion::Strict,
                _ => defaults.bool_coercion,
            },
            falsy_override: match lookup("OPSFORGE_FALSY_OVERRIDE").as_deref() {
                Some(v) if v.eq_ignore_ascii_case("keep") => FalsyOverride::Keep,
                _ => defaults.falsy_override,
            },
            env_prefix: lookup("OPSFORGE_ENV_PREFIX")
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.env_prefix),
        }
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn with_bool_coercion(mut self, mode: BoolCoercion) -> Self {
        self.bool_coercion = mode;
        self
    }

    pub fn with_falsy_override(mut self, policy: FalsyOverride) -> Self {
        self.falsy_override = policy;
        self
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
