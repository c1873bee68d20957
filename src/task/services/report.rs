//! Read-only projections of the store for listings and the dashboard.

use crate::task::{
    domain::{Session, SessionStatus, Task, TaskAlias, TaskId},
    ports::{AliasGrouping, GroupCount, TaskStore, TaskStoreResult},
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Grouped counts shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardGroups {
    /// Alias counts per repository.
    pub by_repo: Vec<GroupCount>,
    /// Alias counts per alias kind.
    pub by_alias_type: Vec<GroupCount>,
    /// Session counts per status.
    pub by_session_status: Vec<GroupCount>,
}

/// A task together with its aliases and session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskOverview {
    /// The task.
    pub task: Task,
    /// Aliases naming the task, in listing order.
    pub aliases: Vec<TaskAlias>,
    /// The task's session, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<Session>,
}

/// Snapshot of every task, alias and session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    /// Grouped counts.
    pub groups: DashboardGroups,
    /// All sessions.
    pub sessions: Vec<Session>,
    /// Sessions whose status is open.
    pub open_sessions: Vec<Session>,
    /// All aliases.
    pub aliases: Vec<TaskAlias>,
    /// Per-task entries in task listing order.
    pub tasks: Vec<TaskOverview>,
}

impl Dashboard {
    /// Returns the one-line summary printed when JSON output is off.
    #[must_use]
    pub fn summary_line(&self) -> String {
        format!(
            "repos={} alias_types={} session_statuses={} aliases={} sessions={} open_sessions={} tasks={}",
            self.groups.by_repo.len(),
            self.groups.by_alias_type.len(),
            self.groups.by_session_status.len(),
            self.aliases.len(),
            self.sessions.len(),
            self.open_sessions.len(),
            self.tasks.len(),
        )
    }
}

/// Builds read-only views over a task store.
#[derive(Clone)]
pub struct ReportService<S: TaskStore> {
    store: Arc<S>,
}

impl<S: TaskStore> ReportService<S> {
    /// Creates a new report service.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Assembles the dashboard snapshot.
    ///
    /// # Errors
    ///
    /// Returns the first store error encountered.
    pub async fn dashboard(&self) -> TaskStoreResult<Dashboard> {
        let groups = DashboardGroups {
            by_repo: self
                .store
                .alias_group_counts(AliasGrouping::Repository)
                .await?,
            by_alias_type: self.store.alias_group_counts(AliasGrouping::AliasKind).await?,
            by_session_status: self.store.session_status_counts().await?,
        };
        let tasks = self.store.list_tasks().await?;
        let aliases = self.store.list_aliases().await?;
        let sessions = self.store.list_sessions().await?;
        let open_sessions = sessions
            .iter()
            .filter(|session| session.status() == SessionStatus::Open)
            .cloned()
            .collect();
        let overviews = merge_task_overviews(tasks, &aliases, &sessions);
        Ok(Dashboard {
            groups,
            sessions,
            open_sessions,
            aliases,
            tasks: overviews,
        })
    }
}

/// Joins aliases and sessions onto tasks, keeping the task order.
#[must_use]
pub fn merge_task_overviews(
    tasks: Vec<Task>,
    aliases: &[TaskAlias],
    sessions: &[Session],
) -> Vec<TaskOverview> {
    let mut aliases_by_task: HashMap<&TaskId, Vec<TaskAlias>> = HashMap::new();
    for alias in aliases {
        aliases_by_task
            .entry(alias.task_id())
            .or_default()
            .push(alias.clone());
    }
    let sessions_by_task: HashMap<&TaskId, &Session> = sessions
        .iter()
        .map(|session| (session.task_id(), session))
        .collect();

    tasks
        .into_iter()
        .map(|task| TaskOverview {
            aliases: aliases_by_task.remove(task.id()).unwrap_or_default(),
            session: sessions_by_task.get(task.id()).map(|session| (*session).clone()),
            task,
        })
        .collect()
}
