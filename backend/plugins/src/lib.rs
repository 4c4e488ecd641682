pub mod cli_args;
pub mod layout;
pub mod lifecycle;

pub use cli_args::{CliOption, DEFAULT_DASH, cli_options};
pub use layout::{CONFIG_FILE, PluginLayout, SCHEMA_FILE};
pub use lifecycle::{
    DeployOutcome, NoHooks, PluginLifecycle, PluginLifecycleContext, PluginState, ScriptHooks,
    run_deploy_sequence,
};
