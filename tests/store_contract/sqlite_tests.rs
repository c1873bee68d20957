//! File-backed durability and integrity checks for the `SQLite` store.

use super::helpers::{Backend, epoch, open_store, temp_db};
use diesel::connection::SimpleConnection;
use diesel::Connection;
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;
use tasklink::task::{
    adapters::{memory::FixedClock, sqlite::SqliteTaskStore},
    domain::{PaneId, Session, SessionLaunch, WorkspaceName},
    ports::{TaskStore, TaskStoreError},
    services::{TaskIdentityError, TaskIdentityService},
};

#[tokio::test(flavor = "multi_thread")]
async fn records_survive_reopening_the_database() {
    let fixture = open_store(Backend::Sqlite);
    let path = fixture.db_path.clone().expect("sqlite fixture has a path");
    let task = fixture.seed_task().await;
    let alias = fixture.pre_pr_alias(&task, "o/r", "b");
    fixture.store.upsert_alias(&alias).await.expect("alias should persist");
    let session = Session::opened(
        task.id().clone(),
        SessionLaunch::new(WorkspaceName::for_task(task.id()), "/w", "codex"),
        PaneId::new(4),
        &fixture.clock,
    );
    fixture.store.upsert_session(&session).await.expect("session should persist");

    let reopened = SqliteTaskStore::open(&path).expect("store should reopen");

    assert_eq!(
        reopened.find_task_by_alias(alias.value()).await.expect("lookup"),
        Some(task.clone())
    );
    assert_eq!(reopened.find_session(task.id()).await.expect("lookup"), Some(session));
}

#[tokio::test(flavor = "multi_thread")]
async fn opening_creates_missing_parent_directories() {
    let (_dir, base) = temp_db();
    let nested = base
        .parent()
        .expect("temp db has a parent")
        .join("nested/deeper/state.db");

    SqliteTaskStore::open(&nested).expect("store should open");

    assert!(nested.exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn alias_whose_task_row_vanished_is_an_integrity_error() {
    let fixture = open_store(Backend::Sqlite);
    let path = fixture.db_path.clone().expect("sqlite fixture has a path");
    let task = fixture.seed_task().await;
    let alias = fixture.pre_pr_alias(&task, "o/r", "b");
    fixture.store.upsert_alias(&alias).await.expect("alias should persist");

    let mut raw = SqliteConnection::establish(path.as_str()).expect("raw connection");
    raw.batch_execute(&format!(
        "PRAGMA foreign_keys = OFF; DELETE FROM tasks WHERE task_id = '{}';",
        task.id()
    ))
    .expect("task row should be deleted");

    let result = fixture.store.find_task_by_alias(alias.value()).await;

    assert!(matches!(result, Err(TaskStoreError::TaskNotFound(id)) if &id == task.id()));
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_processes_converge_on_one_task() {
    let (_dir, path) = temp_db();
    let clock = Arc::new(FixedClock::new(epoch()));
    let handles: Vec<_> = (0..6)
        .map(|_| {
            let store = Arc::new(SqliteTaskStore::open(&path).expect("store should open"));
            let service = TaskIdentityService::new(store, Arc::clone(&clock));
            tokio::spawn(async move {
                service
                    .get_or_create_pre_pr_task("owner/repo", "feature/race")
                    .await
            })
        })
        .collect();

    let mut winners = Vec::new();
    for handle in handles {
        match handle.await.expect("task should join") {
            Ok(ensured) => winners.push(ensured.task),
            Err(TaskIdentityError::Store(TaskStoreError::AliasAlreadyBound { .. })) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    let store = SqliteTaskStore::open(&path).expect("store should reopen");
    let tasks = store.list_tasks().await.expect("tasks should list");
    assert_eq!(tasks.len(), 1, "lost races must not leave orphan tasks");
    let survivor = tasks.first().expect("one task");
    assert!(!winners.is_empty());
    assert!(winners.iter().all(|task| task == survivor));
}
