//! In-memory task store for tests and ephemeral runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::task::{
    domain::{AliasValue, Session, Task, TaskAlias, TaskId},
    ports::{
        AliasGrouping, GroupCount, TaskStore, TaskStoreError, TaskStoreResult, sort_group_counts,
    },
};

/// Thread-safe in-memory task store.
///
/// All state sits behind one read/write lock, so every operation observes and
/// mutates a consistent snapshot.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStore {
    state: Arc<RwLock<InMemoryStoreState>>,
}

#[derive(Debug, Default)]
struct InMemoryStoreState {
    tasks: HashMap<TaskId, Task>,
    aliases: HashMap<AliasValue, TaskAlias>,
    sessions: HashMap<TaskId, Session>,
}

impl InMemoryTaskStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read_state(&self) -> TaskStoreResult<RwLockReadGuard<'_, InMemoryStoreState>> {
        self.state
            .read()
            .map_err(|err| TaskStoreError::persistence(std::io::Error::other(err.to_string())))
    }

    fn write_state(&self) -> TaskStoreResult<RwLockWriteGuard<'_, InMemoryStoreState>> {
        self.state
            .write()
            .map_err(|err| TaskStoreError::persistence(std::io::Error::other(err.to_string())))
    }
}

/// Rejects binding an alias that already names another task.
fn ensure_alias_unbound_elsewhere(
    state: &InMemoryStoreState,
    alias: &TaskAlias,
) -> TaskStoreResult<()> {
    match state.aliases.get(alias.value()) {
        Some(existing) if existing.task_id() != alias.task_id() => {
            Err(TaskStoreError::AliasAlreadyBound {
                alias: alias.value().clone(),
                bound_to: existing.task_id().clone(),
                requested: alias.task_id().clone(),
            })
        }
        _ => Ok(()),
    }
}

fn ensure_task_exists(state: &InMemoryStoreState, task_id: &TaskId) -> TaskStoreResult<()> {
    if state.tasks.contains_key(task_id) {
        Ok(())
    } else {
        Err(TaskStoreError::TaskNotFound(task_id.clone()))
    }
}

fn count_groups<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<GroupCount> {
    let mut totals: HashMap<&str, u64> = HashMap::new();
    for key in keys {
        *totals.entry(key).or_default() += 1;
    }
    let mut counts: Vec<GroupCount> = totals
        .into_iter()
        .map(|(key, count)| GroupCount::new(key, count))
        .collect();
    sort_group_counts(&mut counts);
    counts
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn create_task(&self, task: &Task) -> TaskStoreResult<()> {
        let mut state = self.write_state()?;
        if state.tasks.contains_key(task.id()) {
            return Err(TaskStoreError::DuplicateTask(task.id().clone()));
        }
        state.tasks.insert(task.id().clone(), task.clone());
        Ok(())
    }

    async fn create_task_with_alias(&self, task: &Task, alias: &TaskAlias) -> TaskStoreResult<()> {
        let mut state = self.write_state()?;
        ensure_alias_unbound_elsewhere(&state, alias)?;
        if state.tasks.contains_key(task.id()) {
            return Err(TaskStoreError::DuplicateTask(task.id().clone()));
        }
        if alias.task_id() != task.id() {
            return Err(TaskStoreError::TaskNotFound(alias.task_id().clone()));
        }
        state.tasks.insert(task.id().clone(), task.clone());
        state.aliases.insert(alias.value().clone(), alias.clone());
        Ok(())
    }

    async fn find_task(&self, id: &TaskId) -> TaskStoreResult<Option<Task>> {
        let state = self.read_state()?;
        Ok(state.tasks.get(id).cloned())
    }

    async fn find_task_by_alias(&self, alias: &AliasValue) -> TaskStoreResult<Option<Task>> {
        let state = self.read_state()?;
        let Some(row) = state.aliases.get(alias) else {
            return Ok(None);
        };
        state
            .tasks
            .get(row.task_id())
            .cloned()
            .map(Some)
            .ok_or_else(|| TaskStoreError::TaskNotFound(row.task_id().clone()))
    }

    async fn find_alias(&self, alias: &AliasValue) -> TaskStoreResult<Option<TaskAlias>> {
        let state = self.read_state()?;
        Ok(state.aliases.get(alias).cloned())
    }

    async fn upsert_alias(&self, alias: &TaskAlias) -> TaskStoreResult<()> {
        let mut state = self.write_state()?;
        ensure_alias_unbound_elsewhere(&state, alias)?;
        ensure_task_exists(&state, alias.task_id())?;
        let row = match state.aliases.get(alias.value()) {
            Some(existing) => alias.clone().with_created_at(existing.created_at()),
            None => alias.clone(),
        };
        state.aliases.insert(row.value().clone(), row);
        Ok(())
    }

    async fn upsert_session(&self, session: &Session) -> TaskStoreResult<()> {
        let mut state = self.write_state()?;
        ensure_task_exists(&state, session.task_id())?;
        let row = match state.sessions.get(session.task_id()) {
            Some(existing) => session.clone().with_created_at(existing.created_at()),
            None => session.clone(),
        };
        state.sessions.insert(row.task_id().clone(), row);
        Ok(())
    }

    async fn find_session(&self, task_id: &TaskId) -> TaskStoreResult<Option<Session>> {
        let state = self.read_state()?;
        Ok(state.sessions.get(task_id).cloned())
    }

    async fn list_sessions(&self) -> TaskStoreResult<Vec<Session>> {
        let state = self.read_state()?;
        let mut sessions: Vec<Session> = state.sessions.values().cloned().collect();
        sessions.sort_by(|left, right| {
            right
                .updated_at()
                .cmp(&left.updated_at())
                .then_with(|| left.task_id().cmp(right.task_id()))
        });
        Ok(sessions)
    }

    async fn list_tasks(&self) -> TaskStoreResult<Vec<Task>> {
        let state = self.read_state()?;
        let mut tasks: Vec<Task> = state.tasks.values().cloned().collect();
        tasks.sort_by(|left, right| {
            right
                .updated_at()
                .cmp(&left.updated_at())
                .then_with(|| left.id().cmp(right.id()))
        });
        Ok(tasks)
    }

    async fn list_aliases(&self) -> TaskStoreResult<Vec<TaskAlias>> {
        let state = self.read_state()?;
        let mut aliases: Vec<TaskAlias> = state.aliases.values().cloned().collect();
        aliases.sort_by(|left, right| {
            right
                .updated_at()
                .cmp(&left.updated_at())
                .then_with(|| left.value().cmp(right.value()))
        });
        Ok(aliases)
    }

    async fn alias_group_counts(
        &self,
        grouping: AliasGrouping,
    ) -> TaskStoreResult<Vec<GroupCount>> {
        let state = self.read_state()?;
        let keys = state.aliases.values().map(|alias| match grouping {
            AliasGrouping::Repository => alias.repository().as_str(),
            AliasGrouping::AliasKind => alias.kind().as_str(),
        });
        Ok(count_groups(keys))
    }

    async fn session_status_counts(&self) -> TaskStoreResult<Vec<GroupCount>> {
        let state = self.read_state()?;
        let keys = state
            .sessions
            .values()
            .map(|session| session.status().as_str());
        Ok(count_groups(keys))
    }
}
