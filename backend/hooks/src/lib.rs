//! Lifecycle hook scripts for OpsForge plugins.
//!
//! A plugin may ship `before-deploy.d/` and `after-deploy.d/` directories; the
//! [`HookRunner`] executes their files in name order and reports each outcome.

pub mod error;
pub mod runner;
pub mod types;

pub use error::{FAIL_FAST_EXIT_CODE, HookError};
pub use runner::{DEFAULT_INTERPRETER, HookRunner};
pub use types::{HookOutcome, HookPhase, HookReport};
