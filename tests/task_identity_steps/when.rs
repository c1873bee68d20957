//! When steps for task identity BDD scenarios.

use super::world::{TaskIdentityWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::when;
use tasklink::task::services::OpenSessionRequest;

#[when(r#"the pre-PR task for "{repo}" branch "{branch}" is ensured"#)]
fn ensure_pre_pr_task(
    world: &mut TaskIdentityWorld,
    repo: String,
    branch: String,
) -> Result<(), eyre::Report> {
    let ensured = run_async(world.identity.get_or_create_pre_pr_task(&repo, &branch))
        .wrap_err("ensure pre-PR task")?;
    world.ensured.push(ensured);
    Ok(())
}

#[when(r#"pull request {pr:u64} of "{repo}" is linked from branch "{branch}""#)]
fn link_pull_request(
    world: &mut TaskIdentityWorld,
    pr: u64,
    repo: String,
    branch: String,
) -> Result<(), eyre::Report> {
    let linked = run_async(world.identity.link_pr_to_pre_pr(&repo, &branch, pr))
        .wrap_err("link pull request")?;
    world.last_link = Some(linked);
    Ok(())
}

#[when("a session is opened for the branch task")]
fn open_session(world: &mut TaskIdentityWorld) -> Result<(), eyre::Report> {
    let task_id = world.branch_task()?.id().clone();
    run_async(
        world
            .sessions
            .open_session(&task_id, OpenSessionRequest::new(".", "codex")),
    )
    .wrap_err("open session")?;
    Ok(())
}

#[when("the session pane disappears")]
fn pane_disappears(world: &mut TaskIdentityWorld) -> Result<(), eyre::Report> {
    let task_id = world.branch_task()?.id().clone();
    let session = run_async(world.store_session(&task_id))?;
    let pane_id = session
        .pane_id()
        .ok_or_else(|| eyre::eyre!("session has no bound pane"))?;
    world
        .panes
        .remove_pane(pane_id)
        .wrap_err("remove pane behind the reconciler")?;
    Ok(())
}

#[when("sessions are reconciled")]
fn reconcile_sessions(world: &mut TaskIdentityWorld) -> Result<(), eyre::Report> {
    run_async(world.sessions.reconcile_all()).wrap_err("reconcile sessions")?;
    Ok(())
}
