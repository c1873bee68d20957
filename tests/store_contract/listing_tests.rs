//! Listing order and grouped count contract.

use super::helpers::{Backend, open_store};
use chrono::TimeDelta;
use rstest::rstest;
use tasklink::task::{
    domain::{
        PaneId, PullRequestNumber, RepositoryName, Session, SessionLaunch, TaskAlias, WorkspaceName,
    },
    ports::{AliasGrouping, GroupCount},
};

#[rstest]
#[case::memory(Backend::Memory)]
#[case::sqlite(Backend::Sqlite)]
#[tokio::test(flavor = "multi_thread")]
async fn empty_stores_list_nothing(#[case] backend: Backend) {
    let fixture = open_store(backend);

    assert!(fixture.store.list_tasks().await.expect("list").is_empty());
    assert!(fixture.store.list_aliases().await.expect("list").is_empty());
    assert!(fixture.store.list_sessions().await.expect("list").is_empty());
    assert!(fixture.store.session_status_counts().await.expect("count").is_empty());
    assert!(
        fixture
            .store
            .alias_group_counts(AliasGrouping::Repository)
            .await
            .expect("count")
            .is_empty()
    );
}

#[rstest]
#[case::memory(Backend::Memory)]
#[case::sqlite(Backend::Sqlite)]
#[tokio::test(flavor = "multi_thread")]
async fn tasks_list_newest_first(#[case] backend: Backend) {
    let fixture = open_store(backend);
    let older = fixture.seed_task().await;
    fixture.clock.advance(TimeDelta::seconds(1));
    let newer = fixture.seed_task().await;

    let tasks = fixture.store.list_tasks().await.expect("list");

    assert_eq!(tasks, vec![newer, older]);
}

#[rstest]
#[case::memory(Backend::Memory)]
#[case::sqlite(Backend::Sqlite)]
#[tokio::test(flavor = "multi_thread")]
async fn aliases_list_newest_first_then_by_value(#[case] backend: Backend) {
    let fixture = open_store(backend);
    let task = fixture.seed_task().await;
    let first = fixture.pre_pr_alias(&task, "o/r", "b-2");
    let second = fixture.pre_pr_alias(&task, "o/r", "b-1");
    fixture.clock.advance(TimeDelta::seconds(1));
    let newest = fixture.pre_pr_alias(&task, "o/r", "a");
    for alias in [&first, &second, &newest] {
        fixture.store.upsert_alias(alias).await.expect("alias should persist");
    }

    let values: Vec<String> = fixture
        .store
        .list_aliases()
        .await
        .expect("list")
        .iter()
        .map(|alias| alias.value().to_string())
        .collect();

    assert_eq!(values, vec!["prepr:o/r:a", "prepr:o/r:b-1", "prepr:o/r:b-2"]);
}

#[rstest]
#[case::memory(Backend::Memory)]
#[case::sqlite(Backend::Sqlite)]
#[tokio::test(flavor = "multi_thread")]
async fn alias_groups_count_largest_first_then_by_key(#[case] backend: Backend) {
    let fixture = open_store(backend);
    let task = fixture.seed_task().await;
    for (repo, branch) in [("b/two", "x"), ("b/two", "y"), ("a/one", "x")] {
        fixture
            .store
            .upsert_alias(&fixture.pre_pr_alias(&task, repo, branch))
            .await
            .expect("alias should persist");
    }
    let pr_alias = TaskAlias::pull_request(
        task.id().clone(),
        RepositoryName::new("c/three").expect("valid repository"),
        None,
        PullRequestNumber::new(1).expect("valid number"),
        &fixture.clock,
    );
    fixture.store.upsert_alias(&pr_alias).await.expect("alias should persist");

    let by_repo = fixture
        .store
        .alias_group_counts(AliasGrouping::Repository)
        .await
        .expect("count");
    let by_kind = fixture
        .store
        .alias_group_counts(AliasGrouping::AliasKind)
        .await
        .expect("count");

    assert_eq!(
        by_repo,
        vec![
            GroupCount::new("b/two", 2),
            GroupCount::new("a/one", 1),
            GroupCount::new("c/three", 1),
        ]
    );
    assert_eq!(
        by_kind,
        vec![GroupCount::new("prepr", 3), GroupCount::new("pr", 1)]
    );
}

#[rstest]
#[case::memory(Backend::Memory)]
#[case::sqlite(Backend::Sqlite)]
#[tokio::test(flavor = "multi_thread")]
async fn sessions_count_per_status(#[case] backend: Backend) {
    let fixture = open_store(backend);
    for pane in 1..=3 {
        let task = fixture.seed_task().await;
        let launch = SessionLaunch::new(WorkspaceName::for_task(task.id()), ".", "codex");
        let opened = Session::opened(task.id().clone(), launch, PaneId::new(pane), &fixture.clock);
        let session = if pane == 1 { opened.closed(&fixture.clock) } else { opened };
        fixture.store.upsert_session(&session).await.expect("session should persist");
    }

    let counts = fixture.store.session_status_counts().await.expect("count");
    let sessions = fixture.store.list_sessions().await.expect("list");

    assert_eq!(counts, vec![GroupCount::new("open", 2), GroupCount::new("closed", 1)]);
    assert_eq!(sessions.len(), 3);
}
