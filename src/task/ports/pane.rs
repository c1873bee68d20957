//! Pane-client port for terminal multiplexer control.

use crate::task::domain::{LivePanes, PaneId, WorkspaceName};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for pane-client operations.
pub type PaneClientResult<T> = Result<T, PaneClientError>;

/// Narrow control surface over a terminal multiplexer.
#[async_trait]
pub trait PaneClient: Send + Sync {
    /// Spawns a pane in a new window of `workspace`, starting in `cwd` when
    /// it is non-empty.
    async fn spawn(&self, workspace: &WorkspaceName, cwd: &str) -> PaneClientResult<PaneId>;

    /// Brings a pane to the foreground.
    async fn activate_pane(&self, pane_id: PaneId) -> PaneClientResult<()>;

    /// Terminates a pane.
    async fn kill_pane(&self, pane_id: PaneId) -> PaneClientResult<()>;

    /// Lists the panes that currently exist.
    async fn list_panes(&self) -> PaneClientResult<LivePanes>;
}

/// Errors returned by pane-client adapters.
#[derive(Debug, Clone, Error)]
pub enum PaneClientError {
    /// The external command could not run or exited unsuccessfully.
    #[error("`{program} {}` failed: {message}", .args.join(" "))]
    CommandFailed {
        /// Program that was invoked.
        program: String,
        /// Arguments passed to the program.
        args: Vec<String>,
        /// Captured error output or failure description.
        message: String,
    },

    /// The external command succeeded but its output could not be parsed.
    #[error("`{program} {}` returned unexpected output: {message}", .args.join(" "))]
    MalformedOutput {
        /// Program that was invoked.
        program: String,
        /// Arguments passed to the program.
        args: Vec<String>,
        /// Parse failure description.
        message: String,
    },

    /// The pane is not known to the multiplexer.
    #[error("pane {0} does not exist")]
    PaneNotFound(PaneId),

    /// Generic runtime failure.
    #[error("pane client runtime error: {0}")]
    Runtime(Arc<dyn std::error::Error + Send + Sync>),
}

impl PaneClientError {
    /// Wraps a runtime error from the adapter.
    pub fn runtime(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Runtime(Arc::new(err))
    }
}
