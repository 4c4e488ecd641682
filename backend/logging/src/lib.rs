//! Structured logging for OpsForge.
//!
//! Handles console and rolling JSON file output, level control, and redaction
//! of credentials in free-form text such as hook output.

pub mod logger;
pub mod redact;

pub use logger::{LogOptions, init_logger};
pub use redact::redact_sensitive_data;
