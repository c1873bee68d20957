//! Scripted in-memory pane client for session tests.

use crate::task::{
    domain::{LivePanes, Pane, PaneId, WorkspaceName},
    ports::{PaneClient, PaneClientError, PaneClientResult},
};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, RwLock, RwLockWriteGuard};

/// Pane-client operation that can be scripted to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaneOperation {
    /// [`PaneClient::spawn`].
    Spawn,
    /// [`PaneClient::activate_pane`].
    Activate,
    /// [`PaneClient::kill_pane`].
    Kill,
    /// [`PaneClient::list_panes`].
    List,
}

impl PaneOperation {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Spawn => "spawn",
            Self::Activate => "activate-pane",
            Self::Kill => "kill-pane",
            Self::List => "list",
        }
    }
}

/// A call observed by the in-memory pane client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaneCall {
    /// A spawn request.
    Spawn {
        /// Requested workspace.
        workspace: String,
        /// Requested working directory.
        cwd: String,
    },
    /// An activation request.
    Activate(PaneId),
    /// A kill request.
    Kill(PaneId),
    /// A listing request.
    List,
}

/// In-memory pane client.
///
/// Panes live in a local table instead of a terminal multiplexer. Tests can
/// add or remove panes behind the reconciler's back, script individual
/// operations to fail, and inspect the calls that were made.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaneClient {
    state: Arc<RwLock<InMemoryPaneState>>,
}

#[derive(Debug, Default)]
struct InMemoryPaneState {
    panes: LivePanes,
    last_pane_id: i64,
    failing: HashSet<PaneOperation>,
    calls: Vec<PaneCall>,
}

impl InMemoryPaneClient {
    /// Creates a client with no live panes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn write_state(&self) -> PaneClientResult<RwLockWriteGuard<'_, InMemoryPaneState>> {
        self.state
            .write()
            .map_err(|err| PaneClientError::runtime(std::io::Error::other(err.to_string())))
    }

    /// Registers a live pane, as if it had been opened outside this client.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn add_pane(&self, pane: Pane) -> PaneClientResult<()> {
        let mut state = self.write_state()?;
        state.last_pane_id = state.last_pane_id.max(pane.id().value());
        state.panes.insert(pane);
        Ok(())
    }

    /// Removes a pane, as if the user had closed it by hand.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn remove_pane(&self, pane_id: PaneId) -> PaneClientResult<()> {
        let mut state = self.write_state()?;
        state.panes.remove(pane_id);
        Ok(())
    }

    /// Makes every later call of `operation` fail until
    /// [`Self::recover`] is called.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn fail(&self, operation: PaneOperation) -> PaneClientResult<()> {
        let mut state = self.write_state()?;
        state.failing.insert(operation);
        Ok(())
    }

    /// Clears a scripted failure.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn recover(&self, operation: PaneOperation) -> PaneClientResult<()> {
        let mut state = self.write_state()?;
        state.failing.remove(&operation);
        Ok(())
    }

    /// Returns the calls made so far, oldest first.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn calls(&self) -> PaneClientResult<Vec<PaneCall>> {
        let state = self
            .state
            .read()
            .map_err(|err| PaneClientError::runtime(std::io::Error::other(err.to_string())))?;
        Ok(state.calls.clone())
    }

    /// Returns the panes currently live.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn live_panes(&self) -> PaneClientResult<LivePanes> {
        let state = self
            .state
            .read()
            .map_err(|err| PaneClientError::runtime(std::io::Error::other(err.to_string())))?;
        Ok(state.panes.clone())
    }
}

fn record(
    state: &mut InMemoryPaneState,
    operation: PaneOperation,
    call: PaneCall,
) -> PaneClientResult<()> {
    state.calls.push(call);
    if state.failing.contains(&operation) {
        return Err(PaneClientError::CommandFailed {
            program: "in-memory".to_owned(),
            args: vec![operation.as_str().to_owned()],
            message: "scripted failure".to_owned(),
        });
    }
    Ok(())
}

#[async_trait]
impl PaneClient for InMemoryPaneClient {
    async fn spawn(&self, workspace: &WorkspaceName, cwd: &str) -> PaneClientResult<PaneId> {
        let mut state = self.write_state()?;
        let call = PaneCall::Spawn {
            workspace: workspace.as_str().to_owned(),
            cwd: cwd.to_owned(),
        };
        record(&mut state, PaneOperation::Spawn, call)?;
        state.last_pane_id = state.last_pane_id.saturating_add(1);
        let pane_id = PaneId::new(state.last_pane_id);
        state.panes.insert(Pane::new(pane_id, workspace.as_str()));
        Ok(pane_id)
    }

    async fn activate_pane(&self, pane_id: PaneId) -> PaneClientResult<()> {
        let mut state = self.write_state()?;
        record(&mut state, PaneOperation::Activate, PaneCall::Activate(pane_id))?;
        if state.panes.contains(pane_id) {
            Ok(())
        } else {
            Err(PaneClientError::PaneNotFound(pane_id))
        }
    }

    async fn kill_pane(&self, pane_id: PaneId) -> PaneClientResult<()> {
        let mut state = self.write_state()?;
        record(&mut state, PaneOperation::Kill, PaneCall::Kill(pane_id))?;
        state
            .panes
            .remove(pane_id)
            .map(|_| ())
            .ok_or(PaneClientError::PaneNotFound(pane_id))
    }

    async fn list_panes(&self) -> PaneClientResult<LivePanes> {
        let mut state = self.write_state()?;
        record(&mut state, PaneOperation::List, PaneCall::List)?;
        Ok(state.panes.clone())
    }
}
