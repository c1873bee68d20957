//! Then steps for task identity BDD scenarios.

use super::world::{TaskIdentityWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::then;

#[then("the task was created")]
fn task_was_created(world: &TaskIdentityWorld) -> Result<(), eyre::Report> {
    let last = world
        .ensured
        .last()
        .ok_or_else(|| eyre::eyre!("missing ensure result"))?;
    if !last.created {
        return Err(eyre::eyre!("expected the ensure to create a task"));
    }
    Ok(())
}

#[then("the task already existed")]
fn task_already_existed(world: &TaskIdentityWorld) -> Result<(), eyre::Report> {
    let last = world
        .ensured
        .last()
        .ok_or_else(|| eyre::eyre!("missing ensure result"))?;
    if last.created {
        return Err(eyre::eyre!("expected the ensure to reuse the task"));
    }
    Ok(())
}

#[then("both ensures returned the same task")]
fn both_ensures_match(world: &TaskIdentityWorld) -> Result<(), eyre::Report> {
    match world.ensured.as_slice() {
        [first, second] if first.task == second.task => Ok(()),
        [_, _] => Err(eyre::eyre!("ensures returned different tasks")),
        other => Err(eyre::eyre!("expected two ensure results, found {}", other.len())),
    }
}

#[then(r#"the link status is "{status}""#)]
fn link_status_is(world: &TaskIdentityWorld, status: String) -> Result<(), eyre::Report> {
    let linked = world
        .last_link
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing link result"))?;
    if linked.status.as_str() != status {
        return Err(eyre::eyre!(
            "expected link status {status}, found {}",
            linked.status
        ));
    }
    Ok(())
}

#[then(r#"pull request {pr:u64} of "{repo}" resolves to the branch task"#)]
fn pull_request_resolves(
    world: &TaskIdentityWorld,
    pr: u64,
    repo: String,
) -> Result<(), eyre::Report> {
    let expected = world.branch_task()?;
    let found = run_async(world.identity.get_task_by_pr(&repo, pr))
        .wrap_err("look up task by pull request")?;
    if found.as_ref() != Some(expected) {
        return Err(eyre::eyre!("pull request resolved to {found:?}, expected {expected:?}"));
    }
    Ok(())
}

#[then(r#"the branch task session is "{status}""#)]
fn branch_task_session_is(world: &TaskIdentityWorld, status: String) -> Result<(), eyre::Report> {
    let task_id = world.branch_task()?.id().clone();
    let session = run_async(world.store_session(&task_id))?;
    if session.status().as_str() != status {
        return Err(eyre::eyre!(
            "expected session status {status}, found {}",
            session.status()
        ));
    }
    Ok(())
}
