//! Shared fixtures for the store contract tests.

use camino::Utf8PathBuf;
use chrono::{DateTime, TimeZone, Utc};
use tasklink::task::{
    adapters::{memory::FixedClock, memory::InMemoryTaskStore, sqlite::SqliteTaskStore},
    domain::{BranchName, RepositoryName, Task, TaskAlias},
    ports::TaskStore,
};
use std::sync::Arc;
use tempfile::TempDir;

/// Store backend under test.
#[derive(Debug, Clone, Copy)]
pub enum Backend {
    Memory,
    Sqlite,
}

/// A store, its clock and, for file-backed stores, the database location.
pub struct StoreFixture {
    pub store: Arc<dyn TaskStore>,
    pub clock: FixedClock,
    pub db_path: Option<Utf8PathBuf>,
    _dir: Option<TempDir>,
}

/// Instant every fixture clock starts at.
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0)
        .single()
        .expect("valid fixed instant")
}

/// Creates a temporary directory and the UTF-8 database path inside it.
pub fn temp_db() -> (TempDir, Utf8PathBuf) {
    let dir = TempDir::new().expect("temp dir should be created");
    let path = Utf8PathBuf::from_path_buf(dir.path().join("state.db"))
        .expect("temp path should be UTF-8");
    (dir, path)
}

/// Opens an empty store of the requested backend.
pub fn open_store(backend: Backend) -> StoreFixture {
    let clock = FixedClock::new(epoch());
    match backend {
        Backend::Memory => StoreFixture {
            store: Arc::new(InMemoryTaskStore::new()),
            clock,
            db_path: None,
            _dir: None,
        },
        Backend::Sqlite => {
            let (dir, path) = temp_db();
            let store = SqliteTaskStore::open(&path).expect("sqlite store should open");
            StoreFixture {
                store: Arc::new(store),
                clock,
                db_path: Some(path),
                _dir: Some(dir),
            }
        }
    }
}

impl StoreFixture {
    /// Stores a fresh task.
    pub async fn seed_task(&self) -> Task {
        let task = Task::allocate(&self.clock);
        self.store
            .create_task(&task)
            .await
            .expect("task should persist");
        task
    }

    /// Builds a pre-PR alias for `task`.
    pub fn pre_pr_alias(&self, task: &Task, repo: &str, branch: &str) -> TaskAlias {
        TaskAlias::pre_pr(
            task.id().clone(),
            RepositoryName::new(repo).expect("valid repository"),
            BranchName::new(branch).expect("valid branch"),
            &self.clock,
        )
    }
}
