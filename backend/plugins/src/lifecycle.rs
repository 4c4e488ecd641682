//! Plugin deploy lifecycle: before hooks, config resolution, after hooks.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use opsforge_config::{EnvExports, ResolutionResult, ResolveSettings, resolve_files};
use opsforge_hooks::{HookPhase, HookReport, HookRunner};

use crate::cli_args::{CliOption, cli_options};
use crate::layout::PluginLayout;

/// Current state of a plugin deploy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginState {
    Pending,
    Resolving,
    Deployed,
    Failed,
}

/// Context passed to lifecycle hooks.
#[derive(Debug, Clone)]
pub struct PluginLifecycleContext {
    pub plugin: String,
    pub layout: PluginLayout,
    /// Exports resolved so far; empty before resolution.
    pub env: EnvExports,
}

/// Lifecycle events around a plugin deploy.
#[async_trait]
pub trait PluginLifecycle: Send + Sync {
    /// Called before the plugin config is resolved. An error cancels the deploy.
    async fn before_deploy(&self, ctx: &PluginLifecycleContext) -> Result<Option<HookReport>>;
    /// Called once the config is resolved and exported.
    async fn after_deploy(&self, ctx: &PluginLifecycleContext) -> Result<Option<HookReport>>;
}

/// Runs the plugin's hook script directories.
pub struct ScriptHooks {
    runner: HookRunner,
}

impl ScriptHooks {
    pub fn new(runner: HookRunner) -> Self {
        Self { runner }
    }

    async fn run_phase(
        &self,
        phase: HookPhase,
        ctx: &PluginLifecycleContext,
    ) -> Result<Option<HookReport>> {
        let runner = self.runner.clone().with_envs(ctx.env.iter());
        let report = runner
            .run(phase.label(), &ctx.layout.hooks_dir(phase))
            .await?;
        Ok(Some(report))
    }
}

#[async_trait]
impl PluginLifecycle for ScriptHooks {
    async fn before_deploy(&self, ctx: &PluginLifecycleContext) -> Result<Option<HookReport>> {
        self.run_phase(HookPhase::BeforeDeploy, ctx).await
    }

    async fn after_deploy(&self, ctx: &PluginLifecycleContext) -> Result<Option<HookReport>> {
        self.run_phase(HookPhase::AfterDeploy, ctx).await
    }
}

/// Default no-op lifecycle implementation.
pub struct NoHooks;

#[async_trait]
impl PluginLifecycle for NoHooks {
    async fn before_deploy(&self, ctx: &PluginLifecycleContext) -> Result<Option<HookReport>> {
        debug!(plugin = %ctx.plugin, "before_deploy");
        Ok(None)
    }

    async fn after_deploy(&self, ctx: &PluginLifecycleContext) -> Result<Option<HookReport>> {
        debug!(plugin = %ctx.plugin, "after_deploy");
        Ok(None)
    }
}

/// Everything a deploy produced.
#[derive(Debug, Clone, Serialize)]
pub struct DeployOutcome {
    pub plugin: String,
    pub state: PluginState,
    pub resolution: ResolutionResult,
    pub cli_options: Vec<CliOption>,
    pub before_hooks: Option<HookReport>,
    pub after_hooks: Option<HookReport>,
}

/// Run the full deploy sequence for a plugin.
///
/// Errors from hooks (fail-fast) and from resolution propagate unchanged inside
/// the `anyhow` chain so callers can downcast them for exit codes.
pub async fn run_deploy_sequence(
    layout: &PluginLayout,
    lifecycle: &dyn PluginLifecycle,
    settings: &ResolveSettings,
) -> Result<DeployOutcome> {
    let plugin = layout.name();
    let mut state = PluginState::Pending;
    debug!(plugin = %plugin, ?state, "Running deploy sequence");

    let mut ctx = PluginLifecycleContext {
        plugin: plugin.clone(),
        layout: layout.clone(),
        env: EnvExports::new(),
    };

    let before_hooks = lifecycle.before_deploy(&ctx).await?;

    state = PluginState::Resolving;
    debug!(plugin = %plugin, ?state, "Resolving plugin configuration");
    let resolution = resolve_files(&layout.schema_path(), &layout.config_path(), settings)
        .await
        .with_context(|| format!("Failed to resolve configuration for plugin '{plugin}'"))?;

    let cli_options = cli_options(&resolution.cli_bound);
    for option in &cli_options {
        info!(plugin = %plugin, option = %option.render(), "CLI option");
    }

    ctx.env.merge(&resolution.env);
    let after_hooks = match lifecycle.after_deploy(&ctx).await {
        Ok(report) => report,
        Err(e) => {
            warn!(plugin = %plugin, error = %e, "after_deploy failed");
            return Err(e);
        }
    };

    let failed = [&before_hooks, &after_hooks]
        .into_iter()
        .flatten()
        .any(|report| !report.all_succeeded());
    state = if failed { PluginState::Failed } else { PluginState::Deployed };
    info!(plugin = %plugin, ?state, "Deploy sequence finished");

    Ok(DeployOutcome {
        plugin,
        state,
        resolution,
        cli_options,
        before_hooks,
        after_hooks,
    })
}
