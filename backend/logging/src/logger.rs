//! Structured Logger
//!
//! Wraps `tracing` to provide human-readable console output, optional NDJSON
//! file rotation, and environment-based level control.

use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Logger settings, usually taken from CLI flags.
#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Write daily-rotated JSON logs to this directory.
    pub log_dir: Option<PathBuf>,
    /// Emit console logs as JSON instead of text.
    pub json: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self { level: "info".to_string(), log_dir: None, json: false }
    }
}

/// Initialize the global structured logger.
///
/// Console output goes to stderr so command output on stdout stays clean.
/// Calling this twice is harmless; the second call is ignored.
pub fn init_logger(options: &LogOptions) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&options.level));

    // Rolling file appender: writes NDJSON to `<dir>/opsforge.log.YYYY-MM-DD`
    let file_layer = options.log_dir.as_ref().map(|dir| {
        let appender = RollingFileAppender::new(Rotation::DAILY, dir, "opsforge.log");
        fmt::layer().json().with_writer(appender).with_ansi(false)
    });

    let (text_layer, json_layer) = if options.json {
        (None, Some(fmt::layer().json().with_writer(std::io::stderr)))
    } else {
        (
            Some(fmt::layer().with_writer(std::io::stderr).with_target(false).with_ansi(true)),
            None,
        )
    };

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(text_layer)
        .with(json_layer)
        .with(file_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_is_harmless() {
        let dir = std::env::temp_dir().join("opsforge-logger-test");
        let options = LogOptions { level: "debug".into(), log_dir: Some(dir), json: false };
        init_logger(&options);
        init_logger(&LogOptions::default());
        tracing::info!("logger initialised");
    }
}
