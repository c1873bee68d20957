//! Subprocess execution for multiplexer CLI calls.

use crate::task::ports::{PaneClientError, PaneClientResult};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Runs an external program and returns its standard output.
///
/// Implementations report failures as [`PaneClientError::CommandFailed`]
/// carrying the program and arguments.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `program` with `args` to completion.
    async fn run(&self, program: &str, args: &[String]) -> PaneClientResult<Vec<u8>>;
}

/// Runs commands as child processes with a per-call timeout.
///
/// The child is killed if the call times out or its future is dropped.
#[derive(Debug, Clone, Copy)]
pub struct ProcessRunner {
    timeout: Duration,
}

impl ProcessRunner {
    /// Creates a runner with the given per-command timeout.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

/// Builds a [`PaneClientError::CommandFailed`] for `program args`.
pub fn command_failed(
    program: &str,
    args: &[String],
    message: impl Into<String>,
) -> PaneClientError {
    PaneClientError::CommandFailed {
        program: program.to_owned(),
        args: args.to_vec(),
        message: message.into(),
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, program: &str, args: &[String]) -> PaneClientResult<Vec<u8>> {
        let mut command = Command::new(program);
        command.args(args).stdin(Stdio::null()).kill_on_drop(true);
        tracing::debug!(program, ?args, "running multiplexer command");

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(io_err)) => return Err(command_failed(program, args, io_err.to_string())),
            Err(_elapsed) => {
                return Err(command_failed(
                    program,
                    args,
                    format!("timed out after {}s", self.timeout.as_secs()),
                ));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
            let message = if stderr.is_empty() {
                output.status.to_string()
            } else {
                stderr
            };
            tracing::warn!(program, ?args, message = %message, "multiplexer command failed");
            return Err(command_failed(program, args, message));
        }

        Ok(output.stdout)
    }
}
