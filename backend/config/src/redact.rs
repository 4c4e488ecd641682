//! Redaction of resolved values before they reach a log line.
//!
//! Only presentation is affected; resolution results keep the real values.

use once_cell::sync::Lazy;
use regex::Regex;

/// Property or export names that hold secrets.
static SENSITIVE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(token|secret|password|passwd|api[_-]?key|private[_-]?key|access[_-]?key|credential)",
    )
    .unwrap()
});

/// Whether a property name or export name looks like it holds a secret.
pub fn is_sensitive_name(name: &str) -> bool {
    SENSITIVE_NAME.is_match(name)
}

/// Mask `value` when any of `names` is sensitive: first 4 chars + `***`.
pub fn redact_for<'a>(names: impl IntoIterator<Item = &'a str>, value: &str) -> String {
    if value.is_empty() || !names.into_iter().any(is_sensitive_name) {
        return value.to_string();
    }
    if value.chars().count() > 4 {
        format!("{}***", value.chars().take(4).collect::<String>())
    } else {
        "***".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_sensitive_names() {
        assert_eq!(redact_for(["AWS_SECRET_ACCESS_KEY"], "abcdefgh"), "abcd***");
        assert_eq!(redact_for(["api-key"], "abc"), "***");
        assert_eq!(redact_for(["name", "GITHUB_TOKEN"], "ghp_123456"), "ghp_***");
    }

    #[test]
    fn passthrough_non_sensitive() {
        assert_eq!(redact_for(["stack-action"], "plan"), "plan");
        assert_eq!(redact_for(["password"], ""), "");
    }
}
