//! Service layer reconciling recorded sessions with live terminal panes.

use crate::task::{
    domain::{
        LivePanes, PaneId, Session, SessionLaunch, SessionStatus, TaskDomainError, TaskId,
        WorkspaceName,
    },
    ports::{PaneClient, PaneClientError, TaskStore, TaskStoreError},
};
use mockable::Clock;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Parameters for [`SessionService::open_session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenSessionRequest {
    cwd: String,
    command: String,
    workspace: Option<String>,
}

impl OpenSessionRequest {
    /// Creates a request spawning in `cwd` and labelled with `command`.
    #[must_use]
    pub fn new(cwd: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            cwd: cwd.into(),
            command: command.into(),
            workspace: None,
        }
    }

    /// Overrides the workspace. Blank values leave the default in place.
    #[must_use]
    pub fn with_workspace(mut self, workspace: impl Into<String>) -> Self {
        let value = workspace.into();
        self.workspace = (!value.trim().is_empty()).then_some(value);
        self
    }
}

/// What [`SessionService::open_session`] did to reach an open pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenAction {
    /// The recorded pane was live and was focused.
    Activated,
    /// A pane was spawned because none was bound or activation failed.
    Spawned,
    /// The recorded pane had vanished and a replacement was spawned.
    Respawned,
}

impl OpenAction {
    /// Returns the action label used in command output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Activated => "activated",
            Self::Spawned => "spawned",
            Self::Respawned => "respawned",
        }
    }
}

impl fmt::Display for OpenAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of [`SessionService::open_session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedSession {
    /// Persisted session after the call.
    pub session: Session,
    /// Path taken.
    pub action: OpenAction,
}

/// Outcome of [`SessionService::close_session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseOutcome {
    /// The task has no session; nothing was written.
    Missing,
    /// The session was closed and persisted.
    Closed(Session),
}

/// One status change applied by a reconcile pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStatusChange {
    /// Session owner.
    pub task_id: TaskId,
    /// Status before reconciliation.
    pub from: SessionStatus,
    /// Status after reconciliation.
    pub to: SessionStatus,
}

/// Summary of [`SessionService::reconcile_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Number of sessions compared against the pane listing.
    pub examined: usize,
    /// Changes written back to the store.
    pub changes: Vec<SessionStatusChange>,
}

/// Service-level errors for session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Input validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// Store operation failed.
    #[error(transparent)]
    Store(#[from] TaskStoreError),
    /// Pane client operation failed.
    #[error(transparent)]
    Pane(#[from] PaneClientError),
    /// The pane client reported a spawned pane without a usable identifier.
    #[error("spawned pane reported unbound identifier {0}")]
    UnboundPane(PaneId),
}

/// Result type for session service operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// What to do with a session found when opening.
enum Revisit {
    /// Its live pane was brought forward.
    Activated(Session),
    /// A new pane is needed; the session supplies the workspace.
    Replace(Session),
    /// Its pane vanished; the session has been persisted as closed.
    Stale(Session),
}

/// Opens, closes and reconciles task sessions.
#[derive(Clone)]
pub struct SessionService<S, P, C>
where
    S: TaskStore,
    P: PaneClient,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    panes: Arc<P>,
    clock: Arc<C>,
}

impl<S, P, C> SessionService<S, P, C>
where
    S: TaskStore,
    P: PaneClient,
    C: Clock + Send + Sync,
{
    /// Creates a new session service.
    #[must_use]
    pub const fn new(store: Arc<S>, panes: Arc<P>, clock: Arc<C>) -> Self {
        Self {
            store,
            panes,
            clock,
        }
    }

    /// Ensures the task has an open pane.
    ///
    /// A live recorded pane is activated. A recorded pane missing from the
    /// listing is first persisted as closed, then replaced. Otherwise a pane
    /// is spawned into the requested workspace, the previous session's
    /// workspace, or the workspace derived from the task identifier, in that
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::TaskNotFound`] (as [`SessionError::Store`])
    /// when the task does not exist, [`SessionError::Pane`] when listing or
    /// spawning fails, [`SessionError::UnboundPane`] when the spawned pane
    /// has no positive identifier, and [`SessionError::Store`] when
    /// persistence fails.
    pub async fn open_session(
        &self,
        task_id: &TaskId,
        request: OpenSessionRequest,
    ) -> SessionResult<OpenedSession> {
        self.require_task(task_id).await?;
        let (previous, stale) = match self.store.find_session(task_id).await? {
            Some(session) => match self.revisit(session).await? {
                Revisit::Activated(activated) => {
                    return Ok(OpenedSession {
                        session: activated,
                        action: OpenAction::Activated,
                    });
                }
                Revisit::Replace(prior) => (Some(prior), false),
                Revisit::Stale(prior) => (Some(prior), true),
            },
            None => (None, false),
        };

        let workspace = match (&request.workspace, &previous) {
            (Some(explicit), _) => WorkspaceName::new(explicit)?,
            (None, Some(prior)) => prior.workspace().clone(),
            (None, None) => WorkspaceName::for_task(task_id),
        };
        let spawned = self.panes.spawn(&workspace, &request.cwd).await?;
        let pane_id = PaneId::bound(spawned.value()).ok_or(SessionError::UnboundPane(spawned))?;
        let launch = SessionLaunch::new(workspace, request.cwd, request.command);
        let session = match previous {
            Some(prior) => prior.respawned(launch, pane_id, &*self.clock),
            None => Session::opened(task_id.clone(), launch, pane_id, &*self.clock),
        };
        self.store.upsert_session(&session).await?;

        let action = if stale {
            OpenAction::Respawned
        } else {
            OpenAction::Spawned
        };
        tracing::info!(
            task_id = %task_id,
            %pane_id,
            workspace = %session.workspace(),
            action = %action,
            "opened session pane"
        );
        Ok(OpenedSession { session, action })
    }

    /// Closes the task's session, killing its pane on a best-effort basis.
    ///
    /// Launch parameters are kept so a later open revives the session in
    /// the same workspace.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Store`] when loading or persisting fails. Kill
    /// failures are logged, not returned.
    pub async fn close_session(&self, task_id: &TaskId) -> SessionResult<CloseOutcome> {
        let Some(session) = self.store.find_session(task_id).await? else {
            tracing::debug!(task_id = %task_id, "no session to close");
            return Ok(CloseOutcome::Missing);
        };

        if let Some(pane_id) = session.pane_id() {
            if let Err(err) = self.panes.kill_pane(pane_id).await {
                tracing::warn!(
                    task_id = %task_id,
                    %pane_id,
                    error = %err,
                    "killing session pane failed"
                );
            }
        }

        let closed = session.closed(&*self.clock);
        self.store.upsert_session(&closed).await?;
        tracing::info!(task_id = %task_id, workspace = %closed.workspace(), "closed session");
        Ok(CloseOutcome::Closed(closed))
    }

    /// Reconciles every recorded session against one pane listing, writing
    /// only the sessions whose status changed.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Pane`] when the listing fails, in which case
    /// nothing is written, and [`SessionError::Store`] when persistence
    /// fails.
    pub async fn reconcile_all(&self) -> SessionResult<ReconcileReport> {
        let sessions = self.store.list_sessions().await?;
        let live = self.panes.list_panes().await?;
        let mut report = ReconcileReport {
            examined: sessions.len(),
            changes: Vec::new(),
        };
        for session in sessions {
            if let Some(change) = self.apply_reconciliation(session, &live).await? {
                report.changes.push(change);
            }
        }
        tracing::info!(
            examined = report.examined,
            changed = report.changes.len(),
            "reconciled sessions"
        );
        Ok(report)
    }

    /// Reconciles the session of one task.
    ///
    /// Returns `None` when the task has no session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Pane`] when the listing fails and
    /// [`SessionError::Store`] when persistence fails.
    pub async fn reconcile_session(&self, task_id: &TaskId) -> SessionResult<Option<Session>> {
        let Some(session) = self.store.find_session(task_id).await? else {
            return Ok(None);
        };
        let live = self.panes.list_panes().await?;
        let reconciled = session.clone().reconciled(&live, &*self.clock);
        if reconciled != session {
            self.store.upsert_session(&reconciled).await?;
        }
        Ok(Some(reconciled))
    }

    async fn apply_reconciliation(
        &self,
        session: Session,
        live: &LivePanes,
    ) -> SessionResult<Option<SessionStatusChange>> {
        let from = session.status();
        let to = session.reconciled_status(live);
        if from == to {
            return Ok(None);
        }
        let reconciled = session.reconciled(live, &*self.clock);
        self.store.upsert_session(&reconciled).await?;
        tracing::debug!(task_id = %reconciled.task_id(), %from, %to, "session status changed");
        Ok(Some(SessionStatusChange {
            task_id: reconciled.task_id().clone(),
            from,
            to,
        }))
    }

    async fn revisit(&self, session: Session) -> SessionResult<Revisit> {
        let Some(pane_id) = session.pane_id() else {
            return Ok(Revisit::Replace(session));
        };
        let live = self.panes.list_panes().await?;
        if !live.contains(pane_id) {
            let closed = session.closed(&*self.clock);
            self.store.upsert_session(&closed).await?;
            tracing::info!(task_id = %closed.task_id(), %pane_id, "recorded pane vanished");
            return Ok(Revisit::Stale(closed));
        }
        match self.panes.activate_pane(pane_id).await {
            Ok(()) => {
                let activated = session.activated(&*self.clock);
                self.store.upsert_session(&activated).await?;
                tracing::info!(task_id = %activated.task_id(), %pane_id, "activated session pane");
                Ok(Revisit::Activated(activated))
            }
            Err(err) => {
                tracing::warn!(
                    task_id = %session.task_id(),
                    %pane_id,
                    error = %err,
                    "activating live pane failed; spawning a new one"
                );
                Ok(Revisit::Replace(session))
            }
        }
    }

    async fn require_task(&self, task_id: &TaskId) -> SessionResult<()> {
        match self.store.find_task(task_id).await? {
            Some(_) => Ok(()),
            None => Err(TaskStoreError::TaskNotFound(task_id.clone()).into()),
        }
    }
}

