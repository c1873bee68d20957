//! Alias binding and lookup contract.

use super::helpers::{Backend, open_store};
use chrono::TimeDelta;
use rstest::rstest;
use tasklink::task::{
    domain::{AliasValue, PullRequestNumber, RepositoryName, Task, TaskAlias},
    ports::TaskStoreError,
};

#[rstest]
#[case::memory(Backend::Memory)]
#[case::sqlite(Backend::Sqlite)]
#[tokio::test(flavor = "multi_thread")]
async fn task_created_with_alias_resolves_through_it(#[case] backend: Backend) {
    let fixture = open_store(backend);
    let task = Task::allocate(&fixture.clock);
    let alias = fixture.pre_pr_alias(&task, "Owner/Repo", "feature/x");

    fixture
        .store
        .create_task_with_alias(&task, &alias)
        .await
        .expect("task and alias should persist");

    let found = fixture
        .store
        .find_task_by_alias(alias.value())
        .await
        .expect("lookup should succeed");
    let stored_alias = fixture
        .store
        .find_alias(alias.value())
        .await
        .expect("lookup should succeed");
    assert_eq!(found, Some(task));
    assert_eq!(stored_alias, Some(alias));
}

#[rstest]
#[case::memory(Backend::Memory)]
#[case::sqlite(Backend::Sqlite)]
#[tokio::test(flavor = "multi_thread")]
async fn creating_with_a_bound_alias_writes_nothing(#[case] backend: Backend) {
    let fixture = open_store(backend);
    let winner = Task::allocate(&fixture.clock);
    let loser = Task::allocate(&fixture.clock);
    fixture
        .store
        .create_task_with_alias(&winner, &fixture.pre_pr_alias(&winner, "o/r", "b"))
        .await
        .expect("first binding should persist");

    let result = fixture
        .store
        .create_task_with_alias(&loser, &fixture.pre_pr_alias(&loser, "o/r", "b"))
        .await;

    match result {
        Err(TaskStoreError::AliasAlreadyBound { bound_to, requested, .. }) => {
            assert_eq!(&bound_to, winner.id());
            assert_eq!(&requested, loser.id());
        }
        other => panic!("expected alias conflict, got {other:?}"),
    }
    let orphan = fixture
        .store
        .find_task(loser.id())
        .await
        .expect("lookup should succeed");
    assert_eq!(orphan, None);
}

#[rstest]
#[case::memory(Backend::Memory)]
#[case::sqlite(Backend::Sqlite)]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_task_ids_are_rejected(#[case] backend: Backend) {
    let fixture = open_store(backend);
    let task = fixture.seed_task().await;

    let result = fixture.store.create_task(&task).await;

    assert!(matches!(result, Err(TaskStoreError::DuplicateTask(id)) if &id == task.id()));
}

#[rstest]
#[case::memory(Backend::Memory)]
#[case::sqlite(Backend::Sqlite)]
#[tokio::test(flavor = "multi_thread")]
async fn upserting_an_alias_onto_another_task_conflicts(#[case] backend: Backend) {
    let fixture = open_store(backend);
    let first = fixture.seed_task().await;
    let second = fixture.seed_task().await;
    fixture
        .store
        .upsert_alias(&fixture.pre_pr_alias(&first, "o/r", "b"))
        .await
        .expect("first binding should persist");

    let result = fixture
        .store
        .upsert_alias(&fixture.pre_pr_alias(&second, "o/r", "b"))
        .await;

    assert!(matches!(result, Err(TaskStoreError::AliasAlreadyBound { .. })));
}

#[rstest]
#[case::memory(Backend::Memory)]
#[case::sqlite(Backend::Sqlite)]
#[tokio::test(flavor = "multi_thread")]
async fn re_upserting_refreshes_metadata_but_keeps_creation_time(#[case] backend: Backend) {
    let fixture = open_store(backend);
    let task = fixture.seed_task().await;
    let repository = RepositoryName::new("o/r").expect("valid repository");
    let number = PullRequestNumber::new(8).expect("valid number");
    let original = TaskAlias::pull_request(
        task.id().clone(),
        repository.clone(),
        None,
        number,
        &fixture.clock,
    );
    fixture.store.upsert_alias(&original).await.expect("alias should persist");
    fixture.clock.advance(TimeDelta::minutes(3));

    let refreshed = fixture.pre_pr_alias(&task, "o/r", "feature/late");
    let with_branch = TaskAlias::pull_request(
        task.id().clone(),
        repository,
        refreshed.branch().cloned(),
        number,
        &fixture.clock,
    );
    fixture.store.upsert_alias(&with_branch).await.expect("alias should refresh");

    let stored = fixture
        .store
        .find_alias(original.value())
        .await
        .expect("lookup should succeed")
        .expect("alias should exist");
    assert_eq!(stored.created_at(), original.created_at());
    assert_eq!(stored.updated_at(), with_branch.updated_at());
    assert_eq!(stored.branch().map(|branch| branch.as_str()), Some("feature/late"));
}

#[rstest]
#[case::memory(Backend::Memory)]
#[case::sqlite(Backend::Sqlite)]
#[tokio::test(flavor = "multi_thread")]
async fn aliases_require_an_existing_task(#[case] backend: Backend) {
    let fixture = open_store(backend);
    let ghost = Task::allocate(&fixture.clock);

    let result = fixture
        .store
        .upsert_alias(&fixture.pre_pr_alias(&ghost, "o/r", "b"))
        .await;

    assert!(matches!(result, Err(TaskStoreError::TaskNotFound(id)) if &id == ghost.id()));
}

#[rstest]
#[case::memory(Backend::Memory)]
#[case::sqlite(Backend::Sqlite)]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_aliases_resolve_to_nothing(#[case] backend: Backend) {
    let fixture = open_store(backend);
    let unknown = AliasValue::from_persisted("pr:o/r#404");

    let task = fixture
        .store
        .find_task_by_alias(&unknown)
        .await
        .expect("lookup should succeed");
    let alias = fixture
        .store
        .find_alias(&unknown)
        .await
        .expect("lookup should succeed");

    assert_eq!(task, None);
    assert_eq!(alias, None);
}
