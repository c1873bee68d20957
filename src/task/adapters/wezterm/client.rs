//! `WezTerm` pane client driving `wezterm cli`.

use super::listing::parse_pane_listing;
use super::runner::{CommandRunner, ProcessRunner};
use crate::task::{
    domain::{LivePanes, PaneId, WorkspaceName},
    ports::{PaneClient, PaneClientError, PaneClientResult},
};
use async_trait::async_trait;
use std::time::Duration;

/// Program name used when none is configured.
pub const DEFAULT_WEZTERM_PROGRAM: &str = "wezterm";

/// Pane client backed by the `wezterm cli` subcommands.
#[derive(Debug, Clone)]
pub struct WezTermPaneClient<R = ProcessRunner> {
    program: String,
    runner: R,
}

impl WezTermPaneClient<ProcessRunner> {
    /// Creates a client running `program` as a child process, bounding each
    /// call by `timeout`.
    #[must_use]
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self::with_runner(program, ProcessRunner::new(timeout))
    }
}

impl<R: CommandRunner> WezTermPaneClient<R> {
    /// Creates a client with a custom command runner.
    #[must_use]
    pub fn with_runner(program: impl Into<String>, runner: R) -> Self {
        Self {
            program: program.into(),
            runner,
        }
    }

    /// Returns the configured program.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    async fn cli(&self, args: &[String]) -> PaneClientResult<Vec<u8>> {
        self.runner.run(&self.program, args).await
    }

    fn malformed(&self, args: &[String], message: impl Into<String>) -> PaneClientError {
        PaneClientError::MalformedOutput {
            program: self.program.clone(),
            args: args.to_vec(),
            message: message.into(),
        }
    }
}

fn cli_args(parts: &[&str]) -> Vec<String> {
    std::iter::once("cli")
        .chain(parts.iter().copied())
        .map(str::to_owned)
        .collect()
}

#[async_trait]
impl<R: CommandRunner> PaneClient for WezTermPaneClient<R> {
    async fn spawn(&self, workspace: &WorkspaceName, cwd: &str) -> PaneClientResult<PaneId> {
        let mut args = cli_args(&["spawn", "--new-window", "--workspace", workspace.as_str()]);
        if !cwd.trim().is_empty() {
            args.extend(["--cwd".to_owned(), cwd.to_owned()]);
        }
        let output = self.cli(&args).await?;
        let text = String::from_utf8_lossy(&output);
        let raw_id = text.trim();
        let raw_pane = raw_id
            .parse::<i64>()
            .map_err(|err| self.malformed(&args, format!("pane id {raw_id:?}: {err}")))?;
        let pane_id = PaneId::bound(raw_pane)
            .ok_or_else(|| self.malformed(&args, format!("pane id {raw_pane} is not positive")))?;
        tracing::info!(workspace = %workspace, %pane_id, "spawned pane");
        Ok(pane_id)
    }

    async fn activate_pane(&self, pane_id: PaneId) -> PaneClientResult<()> {
        let id = pane_id.to_string();
        let args = cli_args(&["activate-pane", "--pane-id", &id]);
        self.cli(&args).await.map(|_| ())
    }

    async fn kill_pane(&self, pane_id: PaneId) -> PaneClientResult<()> {
        let id = pane_id.to_string();
        let args = cli_args(&["kill-pane", "--pane-id", &id]);
        self.cli(&args).await.map(|_| ())
    }

    async fn list_panes(&self) -> PaneClientResult<LivePanes> {
        let args = cli_args(&["list", "--format", "json"]);
        let output = self.cli(&args).await?;
        let panes =
            parse_pane_listing(&output).map_err(|err| self.malformed(&args, err.to_string()))?;
        tracing::debug!(live_panes = panes.len(), "listed panes");
        Ok(panes)
    }
}
