//! Shared world state for task identity BDD scenarios.

use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use tasklink::task::{
    adapters::memory::{InMemoryPaneClient, InMemoryTaskStore},
    domain::{Session, Task, TaskId},
    ports::TaskStore,
    services::{EnsuredTask, LinkedTask, SessionService, TaskIdentityService},
};

/// Identity service type used by the BDD world.
pub type TestIdentityService = TaskIdentityService<InMemoryTaskStore, DefaultClock>;

/// Session service type used by the BDD world.
pub type TestSessionService = SessionService<InMemoryTaskStore, InMemoryPaneClient, DefaultClock>;

/// Scenario world for task identity behaviour tests.
pub struct TaskIdentityWorld {
    pub store: Arc<InMemoryTaskStore>,
    pub panes: Arc<InMemoryPaneClient>,
    pub identity: TestIdentityService,
    pub sessions: TestSessionService,
    pub ensured: Vec<EnsuredTask>,
    pub branch_task: Option<Task>,
    pub last_link: Option<LinkedTask>,
}

impl TaskIdentityWorld {
    /// Creates a world over empty in-memory adapters.
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(InMemoryTaskStore::new());
        let panes = Arc::new(InMemoryPaneClient::new());
        let clock = Arc::new(DefaultClock);
        Self {
            identity: TaskIdentityService::new(Arc::clone(&store), Arc::clone(&clock)),
            sessions: SessionService::new(Arc::clone(&store), Arc::clone(&panes), clock),
            store,
            panes,
            ensured: Vec::new(),
            branch_task: None,
            last_link: None,
        }
    }

    /// Returns the task created by a background step.
    ///
    /// # Errors
    ///
    /// Fails when no background step recorded a branch task.
    pub fn branch_task(&self) -> Result<&Task, eyre::Report> {
        self.branch_task
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing branch task in scenario world"))
    }

    /// Loads the stored session of `task_id`.
    ///
    /// # Errors
    ///
    /// Fails when the lookup fails or the task has no session.
    pub async fn store_session(&self, task_id: &TaskId) -> Result<Session, eyre::Report> {
        self.store
            .find_session(task_id)
            .await
            .map_err(|err| eyre::eyre!("session lookup failed: {err}"))?
            .ok_or_else(|| eyre::eyre!("task {task_id} has no session"))
    }
}

impl Default for TaskIdentityWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> TaskIdentityWorld {
    TaskIdentityWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
