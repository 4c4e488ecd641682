/// Hook runner.
///
/// Runs every file of a hooks directory as `<interpreter> <file>`, one after
/// another in lexicographic file-name order. A failing hook is logged and the
/// next one runs; with fail-fast the first failure ends the sequence.
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::error::{HookError, Result};
use crate::types::{HookOutcome, HookReport};

/// Default interpreter for hook scripts.
pub const DEFAULT_INTERPRETER: &str = "bash";

#[derive(Debug, Clone)]
pub struct HookRunner {
    interpreter: String,
    fail_fast: bool,
    envs: BTreeMap<String, String>,
}

impl Default for HookRunner {
    fn default() -> Self {
        Self::new(false)
    }
}

impl HookRunner {
    pub fn new(fail_fast: bool) -> Self {
        Self {
            interpreter: DEFAULT_INTERPRETER.to_string(),
            fail_fast,
            envs: BTreeMap::new(),
        }
    }

    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    /// Extra environment variables passed to every hook process.
    pub fn with_envs<I, K, V>(mut self, envs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.envs
            .extend(envs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Run all hooks in `dir` for the lifecycle `mode` label.
    ///
    /// A missing directory is not an error: there is simply nothing to run.
    pub async fn run(&self, mode: &str, dir: &Path) -> Result<HookReport> {
        let umode = mode.to_uppercase();
        let mut report = HookReport::new(mode);

        if !fs::metadata(dir).await.map(|m| m.is_dir()).unwrap_or(false) {
            debug!(mode = %umode, dir = %dir.display(), "No hooks directory; skipping");
            return Ok(report);
        }

        info!(mode = %umode, "Invoking hooks");
        let hooks = list_hooks(dir).await?;
        debug!(mode = %umode, hooks = ?hook_names(&hooks), "Hooks to run");

        for path in hooks {
            let script = file_name(&path);
            let started_at = Utc::now();
            let clock = Instant::now();

            let output = Command::new(&self.interpreter)
                .arg(&path)
                .envs(&self.envs)
                .output()
                .await;

            let output = match output {
                Ok(output) => output,
                Err(source) => {
                    error!(mode = %umode, hook = %script, error = %source, "Hook could not be started");
                    if self.fail_fast {
                        return Err(HookError::Spawn {
                            mode: mode.to_string(),
                            hook: script,
                            source,
                        });
                    }
                    report.outcomes.push(HookOutcome {
                        script,
                        exit_code: None,
                        stdout: String::new(),
                        stderr: String::new(),
                        started_at,
                        duration: clock.elapsed(),
                    });
                    continue;
                }
            };

            let outcome = HookOutcome {
                script: script.clone(),
                exit_code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                started_at,
                duration: clock.elapsed(),
            };

            if outcome.succeeded() {
                info!(mode = %umode, hook = %script, "Hook successfully completed");
                debug!(hook = %script, stdout = %outcome.stdout);
            } else {
                warn!(mode = %umode, hook = %script, code = ?outcome.exit_code, "Hook failed");
                debug!(hook = %script, stdout = %outcome.stdout, stderr = %outcome.stderr);
                if self.fail_fast {
                    return Err(HookError::Failed {
                        mode: mode.to_string(),
                        hook: script,
                        code: outcome.exit_code,
                    });
                }
            }
            report.outcomes.push(outcome);
        }
        Ok(report)
    }
}

/// Regular files of `dir`, sorted by file name.
async fn list_hooks(dir: &Path) -> Result<Vec<PathBuf>> {
    let list_err = |source| HookError::ListDir {
        dir: dir.to_path_buf(),
        source,
    };
    let mut entries = fs::read_dir(dir).await.map_err(list_err)?;
    let mut hooks = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(list_err)? {
        let path = entry.path();
        // Follows symlinks: a link to a directory is skipped, a dangling one too.
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => hooks.push(path),
            _ => debug!(path = %path.display(), "Skipping non-file entry"),
        }
    }
    hooks.sort_by_key(|p| p.file_name().map(|n| n.to_os_string()));
    Ok(hooks)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn hook_names(hooks: &[PathBuf]) -> Vec<String> {
    hooks.iter().map(|p| file_name(p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_hook(dir: &Path, name: &str, body: &str) {
        std::fs::write(dir.join(name), format!("{body}\n")).unwrap();
    }

    fn runner(fail_fast: bool) -> HookRunner {
        HookRunner::new(fail_fast).with_interpreter("sh")
    }

    #[tokio::test]
    async fn missing_directory_runs_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let report = runner(false)
            .run("before-deploy", &dir.path().join("before-deploy.d"))
            .await
            .unwrap();
        assert!(report.outcomes.is_empty());
    }

    #[tokio::test]
    async fn runs_hooks_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        write_hook(dir.path(), "20-second.sh", "echo second");
        write_hook(dir.path(), "10-first.sh", "echo first");
        write_hook(dir.path(), "30-third.sh", "echo third");
        std::fs::create_dir(dir.path().join("00-subdir")).unwrap();

        let report = runner(false).run("before-deploy", dir.path()).await.unwrap();
        assert_eq!(report.scripts(), vec!["10-first.sh", "20-second.sh", "30-third.sh"]);
        assert!(report.all_succeeded());
        assert_eq!(report.outcomes[0].stdout.trim(), "first");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn follows_symlinks_to_files_only() {
        let dir = tempfile::tempdir().unwrap();
        let elsewhere = tempfile::tempdir().unwrap();
        std::fs::write(elsewhere.path().join("shared.sh"), "echo shared\n").unwrap();
        std::os::unix::fs::symlink(elsewhere.path().join("shared.sh"), dir.path().join("10-link.sh"))
            .unwrap();
        std::os::unix::fs::symlink(elsewhere.path(), dir.path().join("20-dir-link")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone.sh"), dir.path().join("30-dangling.sh"))
            .unwrap();

        let report = runner(false).run("before-deploy", dir.path()).await.unwrap();
        assert_eq!(report.scripts(), vec!["10-link.sh"]);
        assert!(report.all_succeeded());
        assert_eq!(report.outcomes[0].stdout.trim(), "shared");
    }

    #[tokio::test]
    async fn failure_continues_without_fail_fast() {
        let dir = tempfile::tempdir().unwrap();
        write_hook(dir.path(), "a.sh", "exit 3");
        write_hook(dir.path(), "b.sh", "echo ok");

        let report = runner(false).run("after-deploy", dir.path()).await.unwrap();
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.outcomes[0].exit_code, Some(3));
        assert!(report.outcomes[1].succeeded());
        assert_eq!(report.failures().count(), 1);
    }

    #[tokio::test]
    async fn failure_aborts_with_fail_fast() {
        let dir = tempfile::tempdir().unwrap();
        write_hook(dir.path(), "a.sh", "exit 3");
        write_hook(dir.path(), "b.sh", "touch \"$(dirname \"$0\")/ran-b\"");

        let err = runner(true).run("after-deploy", dir.path()).await.unwrap_err();
        assert!(matches!(err, HookError::Failed { code: Some(3), .. }));
        assert_eq!(err.exit_code(), crate::error::FAIL_FAST_EXIT_CODE);
        assert!(!dir.path().join("ran-b").exists());
    }

    #[tokio::test]
    async fn passes_env_to_hooks() {
        let dir = tempfile::tempdir().unwrap();
        write_hook(dir.path(), "env.sh", "echo \"$OPSFORGE_TF_ACTION\"");

        let report = runner(false)
            .with_envs([("OPSFORGE_TF_ACTION", "apply")])
            .run("before-deploy", dir.path())
            .await
            .unwrap();
        assert_eq!(report.outcomes[0].stdout.trim(), "apply");
    }

    #[tokio::test]
    async fn missing_interpreter_is_spawn_failure() {
        let dir = tempfile::tempdir().unwrap();
        write_hook(dir.path(), "a.sh", "true");

        let lenient = HookRunner::new(false).with_interpreter("definitely-not-a-shell-xyz");
        let report = lenient.run("before-deploy", dir.path()).await.unwrap();
        assert_eq!(report.outcomes[0].exit_code, None);

        let strict = HookRunner::new(true).with_interpreter("definitely-not-a-shell-xyz");
        let err = strict.run("before-deploy", dir.path()).await.unwrap_err();
        assert!(matches!(err, HookError::Spawn { .. }));
    }
}
