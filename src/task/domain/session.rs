//! Session values binding a task to a terminal pane.
//!
//! Sessions are immutable values: every transition consumes the current
//! session and returns its successor, so a caller never observes a
//! half-applied change.

use super::{LivePanes, ParseSessionStatusError, PaneId, TaskDomainError, TaskId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Recorded liveness of a session's pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// The pane is bound and was live at the last check.
    Open,
    /// The session was closed explicitly or its pane vanished.
    Closed,
    /// No pane is bound and no close was recorded.
    Unknown,
}

impl SessionStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Unknown => "unknown",
        }
    }
}

impl TryFrom<&str> for SessionStatus {
    type Error = ParseSessionStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            "unknown" => Ok(Self::Unknown),
            _ => Err(ParseSessionStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Multiplexer workspace a session's pane is spawned into.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkspaceName(String);

impl WorkspaceName {
    /// Creates a trimmed workspace name.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyWorkspace`] when the value is blank.
    pub fn new(value: impl AsRef<str>) -> Result<Self, TaskDomainError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyWorkspace);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Derives the default workspace for a task: `task-` followed by the
    /// task identifier with `/`, `:` and `#` replaced by `-`.
    #[must_use]
    pub fn for_task(task_id: &TaskId) -> Self {
        let sanitized: String = task_id
            .as_str()
            .chars()
            .map(|ch| if matches!(ch, '/' | ':' | '#') { '-' } else { ch })
            .collect();
        Self(format!("task-{sanitized}"))
    }

    /// Returns the workspace name as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for WorkspaceName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for WorkspaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where and how a session's pane is launched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionLaunch {
    workspace: WorkspaceName,
    cwd: String,
    command: String,
}

impl SessionLaunch {
    /// Creates launch parameters.
    #[must_use]
    pub fn new(
        workspace: WorkspaceName,
        cwd: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            workspace,
            cwd: cwd.into(),
            command: command.into(),
        }
    }

    /// Returns the workspace.
    #[must_use]
    pub const fn workspace(&self) -> &WorkspaceName {
        &self.workspace
    }

    /// Returns the working directory.
    #[must_use]
    pub fn cwd(&self) -> &str {
        &self.cwd
    }

    /// Returns the command label.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }
}

/// Binding between a task and a terminal pane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    task_id: TaskId,
    #[serde(flatten)]
    launch: SessionLaunch,
    pane_id: Option<PaneId>,
    status: SessionStatus,
    external_session_label: Option<String>,
    last_seen_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSessionData {
    /// Owning task identifier.
    pub task_id: TaskId,
    /// Workspace, working directory and command label.
    pub launch: SessionLaunch,
    /// Bound pane, if any.
    pub pane_id: Option<PaneId>,
    /// Persisted status.
    pub status: SessionStatus,
    /// Label of the program session running inside the pane.
    pub external_session_label: Option<String>,
    /// Last time the pane was observed live.
    pub last_seen_at: DateTime<Utc>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Records a freshly spawned pane for a task that had no session.
    #[must_use]
    pub fn opened(
        task_id: TaskId,
        launch: SessionLaunch,
        pane_id: PaneId,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            task_id,
            launch,
            pane_id: PaneId::bound(pane_id.value()),
            status: SessionStatus::Open,
            external_session_label: None,
            last_seen_at: timestamp,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a session from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedSessionData) -> Self {
        Self {
            task_id: data.task_id,
            launch: data.launch,
            pane_id: data.pane_id,
            status: data.status,
            external_session_label: data.external_session_label,
            last_seen_at: data.last_seen_at,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Rebinds the session to a newly spawned pane.
    ///
    /// The creation timestamp survives; the external session label does not,
    /// since it described the program in the previous pane.
    #[must_use]
    pub fn respawned(self, launch: SessionLaunch, pane_id: PaneId, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            launch,
            pane_id: PaneId::bound(pane_id.value()),
            status: SessionStatus::Open,
            external_session_label: None,
            last_seen_at: timestamp,
            updated_at: timestamp,
            ..self
        }
    }

    /// Marks the bound pane as focused and live.
    #[must_use]
    pub fn activated(self, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            status: SessionStatus::Open,
            last_seen_at: timestamp,
            updated_at: timestamp,
            ..self
        }
    }

    /// Unbinds the pane and marks the session closed. Launch parameters are
    /// kept so the session can be revived in the same place.
    #[must_use]
    pub fn closed(self, clock: &impl Clock) -> Self {
        Self {
            pane_id: None,
            status: SessionStatus::Closed,
            updated_at: clock.utc(),
            ..self
        }
    }

    /// Computes the status this session should have given a live-pane
    /// snapshot.
    #[must_use]
    pub fn reconciled_status(&self, live: &LivePanes) -> SessionStatus {
        match self.pane_id {
            None if self.status == SessionStatus::Closed => SessionStatus::Closed,
            None => SessionStatus::Unknown,
            Some(pane_id) if live.contains(pane_id) => SessionStatus::Open,
            Some(_) => SessionStatus::Closed,
        }
    }

    /// Applies [`Self::reconciled_status`]. Unchanged sessions are returned
    /// as-is; changed ones get a fresh update timestamp, and a fresh
    /// last-seen timestamp when they become open.
    #[must_use]
    pub fn reconciled(self, live: &LivePanes, clock: &impl Clock) -> Self {
        let status = self.reconciled_status(live);
        if status == self.status {
            return self;
        }
        let timestamp = clock.utc();
        let last_seen_at = if status == SessionStatus::Open {
            timestamp
        } else {
            self.last_seen_at
        };
        Self {
            status,
            last_seen_at,
            updated_at: timestamp,
            ..self
        }
    }

    /// Attaches the label of the program session running in the pane.
    #[must_use]
    pub fn with_external_session_label(self, label: impl Into<String>) -> Self {
        let trimmed = label.into().trim().to_owned();
        Self {
            external_session_label: (!trimmed.is_empty()).then_some(trimmed),
            ..self
        }
    }

    /// Carries over the creation timestamp of the row being refreshed.
    #[must_use]
    pub(crate) fn with_created_at(self, created_at: DateTime<Utc>) -> Self {
        Self { created_at, ..self }
    }

    /// Returns the owning task identifier.
    #[must_use]
    pub const fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// Returns the launch parameters.
    #[must_use]
    pub const fn launch(&self) -> &SessionLaunch {
        &self.launch
    }

    /// Returns the workspace.
    #[must_use]
    pub const fn workspace(&self) -> &WorkspaceName {
        self.launch.workspace()
    }

    /// Returns the bound pane, if any.
    #[must_use]
    pub const fn pane_id(&self) -> Option<PaneId> {
        self.pane_id
    }

    /// Returns the session status.
    #[must_use]
    pub const fn status(&self) -> SessionStatus {
        self.status
    }

    /// Returns the external session label, if any.
    #[must_use]
    pub fn external_session_label(&self) -> Option<&str> {
        self.external_session_label.as_deref()
    }

    /// Returns when the pane was last observed live.
    #[must_use]
    pub const fn last_seen_at(&self) -> DateTime<Utc> {
        self.last_seen_at
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
