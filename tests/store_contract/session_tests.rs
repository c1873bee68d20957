//! Session persistence contract.

use super::helpers::{Backend, open_store};
use chrono::TimeDelta;
use rstest::rstest;
use tasklink::task::{
    domain::{PaneId, Session, SessionLaunch, SessionStatus, Task, WorkspaceName},
    ports::TaskStoreError,
};

fn launch(workspace: &str) -> SessionLaunch {
    SessionLaunch::new(
        WorkspaceName::new(workspace).expect("valid workspace"),
        "/src/repo",
        "codex",
    )
}

#[rstest]
#[case::memory(Backend::Memory)]
#[case::sqlite(Backend::Sqlite)]
#[tokio::test(flavor = "multi_thread")]
async fn sessions_round_trip(#[case] backend: Backend) {
    let fixture = open_store(backend);
    let task = fixture.seed_task().await;
    let session = Session::opened(task.id().clone(), launch("w"), PaneId::new(12), &fixture.clock)
        .with_external_session_label("thread-1");

    fixture
        .store
        .upsert_session(&session)
        .await
        .expect("session should persist");

    let stored = fixture
        .store
        .find_session(task.id())
        .await
        .expect("lookup should succeed");
    assert_eq!(stored, Some(session));
}

#[rstest]
#[case::memory(Backend::Memory)]
#[case::sqlite(Backend::Sqlite)]
#[tokio::test(flavor = "multi_thread")]
async fn closed_sessions_store_no_pane(#[case] backend: Backend) {
    let fixture = open_store(backend);
    let task = fixture.seed_task().await;
    let session = Session::opened(task.id().clone(), launch("w"), PaneId::new(3), &fixture.clock)
        .closed(&fixture.clock);

    fixture
        .store
        .upsert_session(&session)
        .await
        .expect("session should persist");

    let stored = fixture
        .store
        .find_session(task.id())
        .await
        .expect("lookup should succeed")
        .expect("session should exist");
    assert_eq!(stored.status(), SessionStatus::Closed);
    assert_eq!(stored.pane_id(), None);
    assert_eq!(stored.external_session_label(), None);
}

#[rstest]
#[case::memory(Backend::Memory)]
#[case::sqlite(Backend::Sqlite)]
#[tokio::test(flavor = "multi_thread")]
async fn replacing_a_session_keeps_its_creation_time(#[case] backend: Backend) {
    let fixture = open_store(backend);
    let task = fixture.seed_task().await;
    let first = Session::opened(task.id().clone(), launch("w"), PaneId::new(1), &fixture.clock);
    fixture.store.upsert_session(&first).await.expect("session should persist");
    fixture.clock.advance(TimeDelta::hours(1));

    let replacement =
        Session::opened(task.id().clone(), launch("other"), PaneId::new(2), &fixture.clock);
    fixture
        .store
        .upsert_session(&replacement)
        .await
        .expect("session should be replaced");

    let stored = fixture
        .store
        .find_session(task.id())
        .await
        .expect("lookup should succeed")
        .expect("session should exist");
    assert_eq!(stored.created_at(), first.created_at());
    assert_eq!(stored.updated_at(), replacement.updated_at());
    assert_eq!(stored.workspace().as_str(), "other");
    assert_eq!(stored.pane_id(), Some(PaneId::new(2)));
}

#[rstest]
#[case::memory(Backend::Memory)]
#[case::sqlite(Backend::Sqlite)]
#[tokio::test(flavor = "multi_thread")]
async fn sessions_require_an_existing_task(#[case] backend: Backend) {
    let fixture = open_store(backend);
    let ghost = Task::allocate(&fixture.clock);
    let session = Session::opened(ghost.id().clone(), launch("w"), PaneId::new(1), &fixture.clock);

    let result = fixture.store.upsert_session(&session).await;

    assert!(matches!(result, Err(TaskStoreError::TaskNotFound(_))));
    let stored = fixture
        .store
        .find_session(ghost.id())
        .await
        .expect("lookup should succeed");
    assert_eq!(stored, None);
}
