mod config;
mod terminal_output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};

use logging::{LogOptions, init_logger, redact_sensitive_data};
use opsforge_config::{
    BoolCoercion, EnvExports, FalsyOverride, ResolutionResult, ResolveSettings, resolve_files,
};
use opsforge_hooks::{HookError, HookPhase, HookReport, HookRunner};
use opsforge_plugins::{DeployOutcome, PluginLayout, PluginState, ScriptHooks, run_deploy_sequence};

use config::Config;
use terminal_output::{note_error, note_info, note_success, note_warn};

#[derive(Parser)]
#[command(name = "opsforge")]
#[command(about = "OpsForge: schema-driven plugin configuration and deploy hooks")]
#[command(version)]
struct Cli {
    /// Log level used when RUST_LOG is unset
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Write daily-rotated JSON logs into this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a plugin config against its schema
    Resolve {
        /// Plugin schema document
        #[arg(long)]
        schema: PathBuf,
        /// Plugin config document
        #[arg(long)]
        config: PathBuf,
        #[command(flatten)]
        resolve: ResolveFlags,
        /// Print the result as JSON
        #[arg(long, conflicts_with = "export")]
        json: bool,
        /// Print `export NAME=value` lines for the environment exports
        #[arg(long)]
        export: bool,
    },
    /// Run one lifecycle hooks directory
    Hooks {
        /// `before-deploy` or `after-deploy`
        #[arg(long, value_parser = parse_phase)]
        mode: HookPhase,
        /// Directory containing the hook scripts
        #[arg(long)]
        dir: PathBuf,
        /// Interpreter each hook is run with
        #[arg(long)]
        interpreter: Option<String>,
        /// Abort on the first failing hook
        #[arg(long)]
        fail_fast: bool,
    },
    /// Run before-deploy hooks, resolve the plugin config, then after-deploy hooks
    Deploy {
        /// Plugin directory holding plugin.schema.yaml and plugin.config.yaml;
        /// repeat to deploy several plugins in order
        #[arg(long = "plugin-dir", required = true)]
        plugin_dirs: Vec<PathBuf>,
        /// Read the plugin config from this file instead (single plugin only)
        #[arg(long)]
        config: Option<PathBuf>,
        #[command(flatten)]
        resolve: ResolveFlags,
        /// Print `export NAME=value` lines for the accumulated exports
        #[arg(long)]
        export: bool,
    },
}

#[derive(Args, Debug, Clone, Copy)]
struct ResolveFlags {
    /// Escalate missing metadata, unsupported types and bad values to errors
    #[arg(long)]
    fail_fast: bool,
    /// Only accept true/false, yes/no, on/off, 1/0 for booleans
    #[arg(long)]
    strict_bool: bool,
    /// Keep falsy config overrides instead of falling back to the default
    #[arg(long)]
    keep_falsy: bool,
}

impl ResolveFlags {
    fn apply(self, settings: ResolveSettings) -> ResolveSettings {
        let mut settings = settings;
        if self.fail_fast {
            settings = settings.with_fail_fast(true);
        }
        if self.strict_bool {
            settings = settings.with_bool_coercion(BoolCoercion::Strict);
        }
        if self.keep_falsy {
            settings = settings.with_falsy_override(FalsyOverride::Keep);
        }
        settings
    }
}

fn parse_phase(raw: &str) -> std::result::Result<HookPhase, String> {
    HookPhase::parse(raw).ok_or_else(|| {
        format!(
            "unknown hook mode '{raw}' (expected {} or {})",
            HookPhase::BeforeDeploy,
            HookPhase::AfterDeploy
        )
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    let mut config = Config::from_env();
    let cli = Cli::parse();

    if let Some(level) = cli.log_level.clone() {
        config.log_level = level;
    }
    if let Some(dir) = cli.log_dir.clone() {
        config.log_dir = Some(dir);
    }
    init_logger(&LogOptions {
        level: config.log_level.clone(),
        log_dir: config.log_dir.clone(),
        json: config.log_json,
    });

    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let message = redact_sensitive_data(&format!("{e:#}"));
            error!(error = %message, "Command failed");
            note_error(&message);
            ExitCode::from(exit_status(&e))
        }
    }
}

/// Map an error chain to the process exit status.
///
/// Hook aborts carry their own status; resolution and every other error is 1.
fn exit_status(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<HookError>()
        .and_then(|e| u8::try_from(e.exit_code()).ok())
        .unwrap_or(1)
}

async fn run(command: Commands, config: Config) -> Result<()> {
    match command {
        Commands::Resolve { schema, config: config_path, resolve, json, export } => {
            let settings = resolve.apply(config.resolve);
            let result = resolve_files(&schema, &config_path, &settings).await?;
            print_resolution(&result, json, export)?;
        }
        Commands::Hooks { mode, dir, interpreter, fail_fast } => {
            let runner = HookRunner::new(fail_fast || config.resolve.fail_fast)
                .with_interpreter(interpreter.unwrap_or(config.hook_interpreter));
            let report = runner.run(mode.label(), &dir).await?;
            print_hook_report(&report);
            if !report.all_succeeded() {
                note_warn(&format!("{} of {} hooks failed", report.failures().count(), report.outcomes.len()));
            }
        }
        Commands::Deploy { plugin_dirs, config: config_path, resolve, export } => {
            if config_path.is_some() && plugin_dirs.len() > 1 {
                bail!("--config can only be used when deploying a single plugin");
            }
            let settings = resolve.apply(config.resolve);
            // Exports accumulate across plugins; later plugins' hooks see earlier ones.
            let mut exports = EnvExports::new();

            for plugin_dir in &plugin_dirs {
                let mut layout = PluginLayout::new(plugin_dir);
                if let Some(path) = &config_path {
                    layout = layout.with_config_path(path);
                }
                let hooks = ScriptHooks::new(
                    HookRunner::new(settings.fail_fast)
                        .with_interpreter(config.hook_interpreter.clone())
                        .with_envs(exports.iter()),
                );

                info!(plugin = %layout.name(), dir = %plugin_dir.display(), "Deploying plugin");
                let outcome = run_deploy_sequence(&layout, &hooks, &settings)
                    .await
                    .with_context(|| format!("Deploy of {} failed", plugin_dir.display()))?;
                exports.merge(&outcome.resolution.env);
                print_deploy_outcome(&outcome);
            }

            if export {
                print!("{}", exports.to_shell_exports());
            }
        }
    }
    Ok(())
}

fn print_deploy_outcome(outcome: &DeployOutcome) {
    for report in [&outcome.before_hooks, &outcome.after_hooks].into_iter().flatten() {
        print_hook_report(report);
    }
    print!("{}", terminal_output::render_resolution(&outcome.resolution));
    for option in &outcome.cli_options {
        note_info(&format!("CLI option {}", redact_sensitive_data(&option.render())));
    }
    match outcome.state {
        PluginState::Deployed => note_success(&format!("Plugin {} deployed", outcome.plugin)),
        _ => note_warn(&format!("Plugin {} finished with failed hooks", outcome.plugin)),
    }
}

fn print_resolution(result: &ResolutionResult, json: bool, export: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else if export {
        print!("{}", result.env.to_shell_exports());
    } else {
        print!("{}", terminal_output::render_resolution(result));
    }
    Ok(())
}

fn print_hook_report(report: &HookReport) {
    print!("{}", terminal_output::render_hook_report(report));
    for outcome in &report.outcomes {
        let stdout = outcome.stdout.trim_end();
        if !stdout.is_empty() {
            println!("{}", redact_sensitive_data(stdout));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsforge_config::ResolveError;
    use std::path::Path;

    #[test]
    fn parses_resolve_flags() {
        let cli = Cli::try_parse_from([
            "opsforge", "resolve", "--schema", "s.yaml", "--config", "c.yaml", "--strict-bool",
            "--keep-falsy",
        ])
        .unwrap();
        let Commands::Resolve { resolve, json, export, .. } = cli.command else {
            panic!("expected resolve");
        };
        assert!(!json && !export);
        let settings = resolve.apply(ResolveSettings::default());
        assert_eq!(settings.bool_coercion, BoolCoercion::Strict);
        assert_eq!(settings.falsy_override, FalsyOverride::Keep);
        assert!(!settings.fail_fast);
    }

    #[test]
    fn parses_hook_mode() {
        let cli = Cli::try_parse_from([
            "opsforge", "--log-level", "debug", "hooks", "--mode", "after-deploy", "--dir", "h",
        ])
        .unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        let Commands::Hooks { mode, dir, .. } = cli.command else {
            panic!("expected hooks");
        };
        assert_eq!(mode, HookPhase::AfterDeploy);
        assert_eq!(dir, Path::new("h"));
    }

    #[test]
    fn rejects_unknown_hook_mode() {
        let err = Cli::try_parse_from(["opsforge", "hooks", "--mode", "during", "--dir", "h"])
            .err()
            .unwrap();
        assert!(err.to_string().contains("unknown hook mode 'during'"));
    }

    fn write_plugin(root: &Path, name: &str, schema: &str, config: &str) -> PathBuf {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("plugin.schema.yaml"), schema).unwrap();
        std::fs::write(dir.join("plugin.config.yaml"), config).unwrap();
        dir
    }

    fn deploy(plugin_dirs: Vec<PathBuf>, config: Option<PathBuf>, fail_fast: bool) -> Commands {
        Commands::Deploy {
            plugin_dirs,
            config,
            resolve: ResolveFlags { fail_fast, strict_bool: false, keep_falsy: false },
            export: false,
        }
    }

    #[tokio::test]
    async fn deploy_passes_earlier_exports_to_later_plugins() {
        let root = tempfile::tempdir().unwrap();
        let network = write_plugin(
            root.path(),
            "network",
            "network:\n  options:\n    properties:\n      vpc-id: {type: string, export_env: VPC_ID}\n",
            "network:\n  options:\n    vpc-id: vpc-42\n",
        );
        let cluster = write_plugin(
            root.path(),
            "cluster",
            "cluster:\n  options:\n    properties:\n      size: {type: int, default: 3}\n",
            "cluster: {}\n",
        );
        let hooks = cluster.join("after-deploy.d");
        std::fs::create_dir_all(&hooks).unwrap();
        std::fs::write(
            hooks.join("10-record.sh"),
            "echo \"$OPSFORGE_VPC_ID\" > \"$(dirname \"$0\")/seen\"\n",
        )
        .unwrap();

        let config = Config { hook_interpreter: "sh".to_string(), ..Config::default() };
        run(deploy(vec![network, cluster], None, false), config).await.unwrap();

        let seen = std::fs::read_to_string(hooks.join("seen")).unwrap();
        assert_eq!(seen.trim(), "vpc-42");
    }

    #[tokio::test]
    async fn deploy_rejects_config_override_for_several_plugins() {
        let err = run(
            deploy(vec!["a".into(), "b".into()], Some("c.yaml".into()), false),
            Config::default(),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("single plugin"));
        assert_eq!(exit_status(&err), 1);
    }

    #[tokio::test]
    async fn deploy_hook_abort_maps_to_fail_fast_status() {
        let root = tempfile::tempdir().unwrap();
        let plugin = write_plugin(
            root.path(),
            "app",
            "app:\n  options:\n    properties:\n      x: {type: string, default: y}\n",
            "app: {}\n",
        );
        let hooks = plugin.join("before-deploy.d");
        std::fs::create_dir_all(&hooks).unwrap();
        std::fs::write(hooks.join("10-fail.sh"), "exit 4\n").unwrap();

        let config = Config { hook_interpreter: "sh".to_string(), ..Config::default() };
        let err = run(deploy(vec![plugin], None, true), config).await.unwrap_err();
        assert_eq!(exit_status(&err), 101);
    }

    #[test]
    fn flags_do_not_clear_env_settings() {
        let from_env = ResolveSettings::default().with_fail_fast(true);
        let flags = ResolveFlags { fail_fast: false, strict_bool: false, keep_falsy: false };
        assert!(flags.apply(from_env).fail_fast);
    }

    #[test]
    fn exit_status_for_hook_abort() {
        let err = anyhow::Error::new(HookError::Failed {
            mode: "before-deploy".into(),
            hook: "10-check.sh".into(),
            code: Some(2),
        })
        .context("Deploy of /p failed");
        assert_eq!(exit_status(&err), 101);
    }

    #[test]
    fn exit_status_for_resolution_error() {
        let err = anyhow::Error::new(ResolveError::RequiredValueMissing {
            properties: vec!["workspace".into()],
        });
        assert_eq!(exit_status(&err), 1);
        assert_eq!(exit_status(&anyhow::anyhow!("other")), 1);
    }

    #[tokio::test]
    async fn resolve_command_fails_on_missing_required() {
        let dir = tempfile::tempdir().unwrap();
        let schema = dir.path().join("schema.yaml");
        let config_path = dir.path().join("config.yaml");
        std::fs::write(
            &schema,
            "app:\n  options:\n    properties:\n      region:\n        type: string\n        required: true\n",
        )
        .unwrap();
        std::fs::write(&config_path, "app: {}\n").unwrap();

        let command = Commands::Resolve {
            schema,
            config: config_path,
            resolve: ResolveFlags { fail_fast: false, strict_bool: false, keep_falsy: false },
            json: false,
            export: true,
        };
        let err = run(command, Config::default()).await.unwrap_err();
        assert_eq!(exit_status(&err), 1);
        assert!(err.downcast_ref::<ResolveError>().unwrap().is_required_missing());
    }
}
