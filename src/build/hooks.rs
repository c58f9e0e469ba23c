//! Lifecycle hooks run before and after a target compiles.

use std::fmt;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::Arc;
use thiserror::Error;

/// When a hook runs relative to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookStage {
    Before,
    After,
}

impl fmt::Display for HookStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookStage::Before => write!(f, "before"),
            HookStage::After => write!(f, "after"),
        }
    }
}

/// Hook failure
#[derive(Debug, Error)]
pub enum HookError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` exited with {status}{}", stderr_suffix(.stderr))]
    Failed { command: String, status: String, stderr: String },
    #[error("{0}")]
    Callback(String),
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {}", trimmed)
    }
}

/// What a callback hook is told about its invocation.
#[derive(Debug, Clone, Copy)]
pub struct HookContext<'a> {
    pub target: &'a str,
    pub stage: HookStage,
    pub project_root: &'a Path,
}

pub type HookFn = dyn Fn(&HookContext<'_>) -> Result<(), HookError> + Send + Sync;

/// A lifecycle action: an in-process callback or a shell command.
#[derive(Clone)]
pub enum Hook {
    Callback(Arc<HookFn>),
    Shell(String),
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hook::Callback(_) => write!(f, "Callback(..)"),
            Hook::Shell(cmd) => f.debug_tuple("Shell").field(cmd).finish(),
        }
    }
}

impl Hook {
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&HookContext<'_>) -> Result<(), HookError> + Send + Sync + 'static,
    {
        Hook::Callback(Arc::new(f))
    }

    pub fn shell(command: impl Into<String>) -> Self {
        Hook::Shell(command.into())
    }
}

fn shell_command(command: &str) -> Command {
    if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    }
}

/// Run a shell command in `cwd`, waiting for it to finish.
///
/// With `inherit_stdio` the child shares the terminal; otherwise its output is
/// captured and stderr is reported on failure.
pub fn run_shell(
    command: &str,
    cwd: &Path,
    envs: &[(&str, &str)],
    inherit_stdio: bool,
) -> Result<(), HookError> {
    let mut cmd = shell_command(command);
    cmd.current_dir(cwd).envs(envs.iter().copied());

    let spawn_err = |source| HookError::Spawn { command: command.to_string(), source };

    if inherit_stdio {
        let status = cmd
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(spawn_err)?;
        if !status.success() {
            return Err(HookError::Failed {
                command: command.to_string(),
                status: status.to_string(),
                stderr: String::new(),
            });
        }
    } else {
        let output = cmd.stdin(Stdio::null()).output().map_err(spawn_err)?;
        if !output.status.success() {
            return Err(HookError::Failed {
                command: command.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
    }
    Ok(())
}

/// Execute a hook. Errors are returned to the caller, never swallowed.
pub fn exec_hook(hook: &Hook, ctx: &HookContext<'_>, debug: bool) -> Result<(), HookError> {
    match hook {
        Hook::Callback(f) => f(ctx),
        Hook::Shell(command) => {
            let stage = ctx.stage.to_string();
            run_shell(
                command,
                ctx.project_root,
                &[("FORGE_TARGET", ctx.target), ("FORGE_HOOK", stage.as_str())],
                debug,
            )
        }
    }
}
