//! Process execution with redacted, streamed output.

use crate::error::{PipewrightError, Result};
use crate::shell::redactor::OutputChannel;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Result of executing a command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Execution duration.
    pub duration: Duration,

    /// Whether command succeeded (exit code 0).
    pub success: bool,
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// Environment variables, applied in order on top of the agent's own.
    pub env: Vec<(String, String)>,
}

impl CommandOptions {
    /// Options running in `cwd` with the given environment.
    pub fn new(cwd: impl Into<PathBuf>, env: Vec<(String, String)>) -> Self {
        Self {
            cwd: Some(cwd.into()),
            env,
        }
    }
}

/// Split `KEY=VALUE` entries into pairs, dropping entries without a key.
pub fn parse_env_entries<S: AsRef<str>>(entries: &[S]) -> Vec<(String, String)> {
    entries
        .iter()
        .filter_map(|entry| {
            let entry = entry.as_ref();
            match entry.split_once('=') {
                Some((key, value)) if !key.is_empty() => Some((key.to_string(), value.to_string())),
                _ => {
                    warn!("Ignoring malformed environment entry without a key");
                    None
                }
            }
        })
        .collect()
}

/// Execute `program` with `args`, streaming both output pipes through `output`.
pub fn execute_streaming(
    program: &str,
    args: &[String],
    options: &CommandOptions,
    output: &OutputChannel,
) -> Result<CommandResult> {
    let start = Instant::now();
    let shown = output.masker.mask(&display_command(program, args));
    debug!("Running command: {}", shown);

    let mut cmd = Command::new(program);
    cmd.args(args);

    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }

    for (key, value) in &options.env {
        cmd.env(key, value);
    }

    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|source| PipewrightError::CommandSpawn {
        command: shown.clone(),
        source,
    })?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let redactor = output.redactor();
    let sink = &*output.sink;

    thread::scope(|scope| {
        if let Some(stdout) = stdout {
            scope.spawn(|| redactor.drain(stdout, sink));
        }
        if let Some(stderr) = stderr {
            scope.spawn(|| redactor.drain(stderr, sink));
        }
    });

    let status = child.wait().map_err(|source| PipewrightError::CommandSpawn {
        command: shown.clone(),
        source,
    })?;

    Ok(CommandResult {
        exit_code: status.code(),
        duration: start.elapsed(),
        success: status.success(),
    })
}

/// Execute a command and turn a non-zero exit into [`PipewrightError::CommandFailed`].
pub fn run_checked(
    program: &str,
    args: &[String],
    options: &CommandOptions,
    output: &OutputChannel,
) -> Result<CommandResult> {
    let result = execute_streaming(program, args, options, output)?;
    if !result.success {
        return Err(PipewrightError::CommandFailed {
            command: output.masker.mask(&display_command(program, args)),
            code: result.exit_code,
        });
    }
    Ok(result)
}

/// Run a script through the platform shell, failing on a non-zero exit.
pub fn run_script(
    script: &str,
    options: &CommandOptions,
    output: &OutputChannel,
) -> Result<CommandResult> {
    let (shell, flag) = shell_invocation();
    run_checked(shell, &[flag.to_string(), script.to_string()], options, output)
}

fn display_command(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Shell binary and the flag that passes it a script.
fn shell_invocation() -> (&'static str, &'static str) {
    if cfg!(target_os = "windows") {
        ("cmd.exe", "/C")
    } else {
        ("sh", "-c")
    }
}
