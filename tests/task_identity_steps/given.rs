//! Given steps for task identity BDD scenarios.

use super::world::{TaskIdentityWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use tasklink::task::ports::TaskStore;

#[given("an empty task store")]
fn empty_task_store(world: &mut TaskIdentityWorld) -> Result<(), eyre::Report> {
    let tasks = run_async(world.store.list_tasks()).wrap_err("list tasks in fresh store")?;
    if !tasks.is_empty() {
        return Err(eyre::eyre!("expected an empty store, found {} tasks", tasks.len()));
    }
    Ok(())
}

#[given(r#"the pre-PR task for "{repo}" branch "{branch}" exists"#)]
fn pre_pr_task_exists(
    world: &mut TaskIdentityWorld,
    repo: String,
    branch: String,
) -> Result<(), eyre::Report> {
    let ensured = run_async(world.identity.get_or_create_pre_pr_task(&repo, &branch))
        .wrap_err("ensure pre-PR task for scenario background")?;
    world.branch_task = Some(ensured.task);
    Ok(())
}

#[given(r#"pull request {pr:u64} of "{repo}" was already linked from branch "{branch}""#)]
fn pull_request_already_linked(
    world: &mut TaskIdentityWorld,
    pr: u64,
    repo: String,
    branch: String,
) -> Result<(), eyre::Report> {
    run_async(world.identity.link_pr_to_pre_pr(&repo, &branch, pr))
        .wrap_err("link pull request for scenario background")?;
    Ok(())
}
