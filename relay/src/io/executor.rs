//! Executor abstraction for running single commands.
//!
//! The [`CommandExecutor`] trait decouples the coordinator from how commands
//! actually run. [`ShellExecutor`] spawns them through a shell; tests use
//! scripted executors from `test_support` that never spawn processes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, instrument};

use crate::io::config::RelayConfig;
use crate::io::process::run_shell;

/// Raw result of one command, before the exit policy judges it.
///
/// A non-zero exit code is data, not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutput {
    /// `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub output: Vec<u8>,
    pub timed_out: bool,
}

impl RunOutput {
    pub fn exited(code: i32, output: impl Into<Vec<u8>>) -> Self {
        Self {
            exit_code: Some(code),
            output: output.into(),
            timed_out: false,
        }
    }
}

/// Runs one command at a time. `Err` means the command could not be run at all.
pub trait CommandExecutor {
    fn run(&mut self, command: &str) -> Result<RunOutput>;
}

/// Executor that runs commands through a shell in a tracked working directory.
///
/// `cd <dir>` is handled in-process so later commands in the same executor see
/// the new directory; anything else is handed to the shell.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    shell: Vec<String>,
    cwd: PathBuf,
    timeout: Duration,
    output_limit_bytes: usize,
}

impl ShellExecutor {
    pub fn new(
        shell: Vec<String>,
        cwd: PathBuf,
        timeout: Duration,
        output_limit_bytes: usize,
    ) -> Self {
        Self {
            shell,
            cwd,
            timeout,
            output_limit_bytes,
        }
    }

    pub fn from_config(cfg: &RelayConfig, cwd: PathBuf) -> Self {
        Self::new(
            cfg.shell.clone(),
            cwd,
            cfg.command_timeout(),
            cfg.output_limit_bytes,
        )
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    fn change_dir(&mut self, target: &str) -> RunOutput {
        let resolved = match resolve_target(&self.cwd, target) {
            Some(path) => path,
            None => return RunOutput::exited(1, "cd: HOME not set\n"),
        };
        match resolved.canonicalize() {
            Ok(path) if path.is_dir() => {
                debug!(cwd = %path.display(), "changed directory");
                self.cwd = path;
                RunOutput::exited(0, Vec::new())
            }
            _ => RunOutput::exited(1, format!("cd: no such file or directory: {target}\n")),
        }
    }
}

impl CommandExecutor for ShellExecutor {
    #[instrument(skip_all, fields(cwd = %self.cwd.display()))]
    fn run(&mut self, command: &str) -> Result<RunOutput> {
        if let Some(target) = parse_cd(command) {
            return Ok(self.change_dir(target));
        }

        info!(command, "running command");
        let out = run_shell(
            &self.shell,
            command,
            &self.cwd,
            self.timeout,
            self.output_limit_bytes,
        )
        .with_context(|| format!("run '{command}'"))?;
        Ok(RunOutput {
            exit_code: out.status.code(),
            output: out.combined(),
            timed_out: out.timed_out,
        })
    }
}

/// Recognise a plain `cd` (no chaining, pipes, or redirection).
///
/// Returns the target (empty for a bare `cd`).
fn parse_cd(command: &str) -> Option<&str> {
    let trimmed = command.trim();
    let rest = trimmed.strip_prefix("cd")?;
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    if rest.contains([';', '&', '|', '<', '>', '$', '`']) {
        return None;
    }
    let target = rest.trim();
    Some(strip_quotes(target))
}

fn strip_quotes(target: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = target
            .strip_prefix(quote)
            .and_then(|t| t.strip_suffix(quote))
        {
            return inner;
        }
    }
    target
}

fn resolve_target(cwd: &Path, target: &str) -> Option<PathBuf> {
    let home = || std::env::var_os("HOME").map(PathBuf::from);
    if target.is_empty() || target == "~" {
        return home();
    }
    if let Some(rest) = target.strip_prefix("~/") {
        return home().map(|h| h.join(rest));
    }
    Some(cwd.join(target))
}
