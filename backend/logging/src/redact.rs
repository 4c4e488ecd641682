//! Log Redaction Layer
//!
//! Scrubs API keys, cloud credentials and bearer tokens from free-form text
//! (hook output, error messages) before it is logged or printed.

use regex::Regex;
use std::sync::LazyLock;

static AWS_KEY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(AKIA|ASIA)[A-Z0-9]{16}\b").unwrap());
static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(sk-[a-zA-Z0-9]{32,})|(gh[pousr]_[A-Za-z0-9]{20,})|(Bearer\s+[a-zA-Z0-9\-\._~+/]+=*)").unwrap()
});
static SECRET_ASSIGN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([A-Z0-9_]*(?:SECRET|TOKEN|PASSWORD)[A-Z0-9_]*)=(\S+)").unwrap()
});

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let mut redacted = input.to_string();

    // Redact cloud access key ids
    redacted = AWS_KEY_RE.replace_all(&redacted, "[REDACTED_KEY]").to_string();

    // Redact API keys and bearer tokens
    redacted = API_KEY_RE.replace_all(&redacted, "[REDACTED_TOKEN]").to_string();

    // Redact `NAME=value` assignments of secret-looking variables
    redacted = SECRET_ASSIGN_RE.replace_all(&redacted, "$1=[REDACTED]").to_string();

    redacted
}
