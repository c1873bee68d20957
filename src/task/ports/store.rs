//! Store port for tasks, aliases and sessions.

use crate::task::domain::{AliasValue, Session, Task, TaskAlias, TaskId};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task store operations.
pub type TaskStoreResult<T> = Result<T, TaskStoreError>;

/// Durable persistence contract shared by every store backend.
///
/// Each method is one atomic unit: it either applies completely or leaves the
/// store unchanged. Dropping a returned future before completion cancels the
/// call without a partial write.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::DuplicateTask`] when the identifier exists.
    async fn create_task(&self, task: &Task) -> TaskStoreResult<()>;

    /// Stores a new task together with its first alias.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::AliasAlreadyBound`] when the alias already
    /// names a task, or [`TaskStoreError::DuplicateTask`] when the identifier
    /// exists. Neither row is written in either case.
    async fn create_task_with_alias(&self, task: &Task, alias: &TaskAlias) -> TaskStoreResult<()>;

    /// Finds a task by identifier.
    async fn find_task(&self, id: &TaskId) -> TaskStoreResult<Option<Task>>;

    /// Resolves an alias to its task.
    ///
    /// Returns `None` when the alias is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::TaskNotFound`] when the alias exists but its
    /// task row does not.
    async fn find_task_by_alias(&self, alias: &AliasValue) -> TaskStoreResult<Option<Task>>;

    /// Finds an alias row.
    async fn find_alias(&self, alias: &AliasValue) -> TaskStoreResult<Option<TaskAlias>>;

    /// Inserts an alias, or refreshes its metadata when it already names the
    /// same task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::AliasAlreadyBound`] when the alias names a
    /// different task, or [`TaskStoreError::TaskNotFound`] when the target
    /// task does not exist.
    async fn upsert_alias(&self, alias: &TaskAlias) -> TaskStoreResult<()>;

    /// Inserts or replaces the session of a task. The stored creation
    /// timestamp of an existing session is kept.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::TaskNotFound`] when the task does not exist.
    async fn upsert_session(&self, session: &Session) -> TaskStoreResult<()>;

    /// Finds the session of a task.
    async fn find_session(&self, task_id: &TaskId) -> TaskStoreResult<Option<Session>>;

    /// Lists sessions, most recently updated first, then by task identifier.
    async fn list_sessions(&self) -> TaskStoreResult<Vec<Session>>;

    /// Lists tasks, most recently updated first, then by task identifier.
    async fn list_tasks(&self) -> TaskStoreResult<Vec<Task>>;

    /// Lists aliases, most recently updated first, then by alias value.
    async fn list_aliases(&self) -> TaskStoreResult<Vec<TaskAlias>>;

    /// Counts aliases per group, largest group first, then by key.
    async fn alias_group_counts(&self, grouping: AliasGrouping) -> TaskStoreResult<Vec<GroupCount>>;

    /// Counts sessions per status, largest group first, then by key.
    async fn session_status_counts(&self) -> TaskStoreResult<Vec<GroupCount>>;
}

/// Column used to group alias counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AliasGrouping {
    /// Group by normalised repository.
    #[default]
    Repository,
    /// Group by alias kind.
    AliasKind,
}

impl AliasGrouping {
    /// Returns the grouping name used on the command line and in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Repository => "repo",
            Self::AliasKind => "alias_type",
        }
    }
}

impl TryFrom<&str> for AliasGrouping {
    type Error = TaskStoreError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "repo" => Ok(Self::Repository),
            "alias_type" => Ok(Self::AliasKind),
            other => Err(TaskStoreError::UnsupportedGrouping(other.to_owned())),
        }
    }
}

impl fmt::Display for AliasGrouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a grouped count. Missing keys are reported as `""`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    /// Group key.
    pub key: String,
    /// Number of rows in the group.
    pub count: u64,
}

impl GroupCount {
    /// Creates a grouped count.
    #[must_use]
    pub fn new(key: impl Into<String>, count: u64) -> Self {
        Self {
            key: key.into(),
            count,
        }
    }
}

/// Orders grouped counts largest first, then by key.
pub fn sort_group_counts(counts: &mut [GroupCount]) {
    counts.sort_by(|left, right| {
        right
            .count
            .cmp(&left.count)
            .then_with(|| left.key.cmp(&right.key))
    });
}

/// Errors returned by task store implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskStoreError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The alias already names a different task.
    #[error("alias {alias} is already bound to task {bound_to}, refusing to rebind it to {requested}")]
    AliasAlreadyBound {
        /// Alias being bound.
        alias: AliasValue,
        /// Task the alias currently names.
        bound_to: TaskId,
        /// Task the caller asked for.
        requested: TaskId,
    },

    /// The referenced task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The requested grouping is not supported.
    #[error("unsupported grouping: {0}")]
    UnsupportedGrouping(String),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
