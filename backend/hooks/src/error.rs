//! Hook runner errors.

use std::path::PathBuf;
use thiserror::Error;

/// Process exit status used when a hook aborts the run under fail-fast.
pub const FAIL_FAST_EXIT_CODE: i32 = 101;

#[derive(Debug, Error)]
pub enum HookError {
    /// A hook exited non-zero while fail-fast was enabled.
    #[error("{mode} hook [{hook}] failed with exit code {code:?}")]
    Failed {
        mode: String,
        hook: String,
        code: Option<i32>,
    },

    /// A hook could not be started.
    #[error("{mode} hook [{hook}] could not be started: {source}")]
    Spawn {
        mode: String,
        hook: String,
        #[source]
        source: std::io::Error,
    },

    /// The hooks directory exists but cannot be listed.
    #[error("cannot list hooks directory {}: {source}", .dir.display())]
    ListDir {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl HookError {
    /// Exit status the process should terminate with.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Failed { .. } | Self::Spawn { .. } => FAIL_FAST_EXIT_CODE,
            Self::ListDir { .. } => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, HookError>;
