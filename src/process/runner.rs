use super::spec::{CommandSpec, StdioMode};
use crate::errors::ProcessError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

/// Exit status and captured streams of a finished command.
///
/// For [`StdioMode::Inherit`] commands the streams went to the terminal and
/// `stdout`/`stderr` are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was terminated by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Exit code with signal termination mapped to -1.
    pub fn code(&self) -> i32 {
        self.status.unwrap_or(-1)
    }

    /// One-line reason for a failed command: the last stderr line if any,
    /// otherwise the exit code.
    pub fn failure_reason(&self) -> String {
        let tail = self
            .stderr
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty());
        match tail {
            Some(line) => format!("exit {}: {}", self.code(), line),
            None => format!("exit {}", self.code()),
        }
    }
}

/// Runs a [`CommandSpec`] to completion.
///
/// A non-zero exit is not an error here; callers inspect
/// [`CommandOutput::success`]. Errors are reserved for commands that could not
/// be spawned, waited on, or finished within their timeout.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ProcessError>;
}

/// Spawns real processes with tokio, rooted at the project directory.
pub struct SystemRunner {
    working_dir: PathBuf,
}

impl SystemRunner {
    pub fn new(working_dir: impl AsRef<Path>) -> Self {
        Self {
            working_dir: working_dir.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ProcessError> {
        debug!(command = %spec, "spawning");

        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .current_dir(&self.working_dir)
            .kill_on_drop(true);

        match spec.stdio {
            StdioMode::Capture => {
                command
                    .stdin(Stdio::null())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped());
            }
            StdioMode::Inherit => {
                command
                    .stdin(Stdio::inherit())
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit());
            }
        }

        let child = command.spawn().map_err(|source| ProcessError::SpawnFailed {
            program: spec.program.clone(),
            source,
        })?;

        // Dropping the future on timeout drops the child, which kills it.
        let waited = match spec.timeout {
            Some(limit) => timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| ProcessError::TimedOut {
                    command: spec.to_string(),
                    secs: limit.as_secs(),
                })?,
            None => child.wait_with_output().await,
        };
        let output = waited.map_err(|source| ProcessError::Wait {
            command: spec.to_string(),
            source,
        })?;

        let result = CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(command = %spec, status = result.code(), "finished");
        Ok(result)
    }
}

/// Prints each command instead of running it and reports success.
pub struct DryRunRunner;

#[async_trait]
impl CommandRunner for DryRunRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ProcessError> {
        println!("{}", spec);
        Ok(CommandOutput {
            status: Some(0),
            ..Default::default()
        })
    }
}
