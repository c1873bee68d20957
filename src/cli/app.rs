//! Execution of parsed task commands.

use super::output;
use super::{AliasGroupArg, SelectorArgs, SessionGroupArg, TaskCommand};
use crate::editor::resolve_editor_command;
use crate::notes::{NoteError, TaskNotes};
use crate::task::{
    domain::{AliasValue, BranchName, PullRequestNumber, RepositoryName, TaskDomainError},
    ports::{PaneClient, TaskStore, TaskStoreError},
    services::{
        CloseOutcome, OpenSessionRequest, ReportService, SessionError, SessionService,
        TaskIdentityError, TaskIdentityService,
    },
};
use mockable::Clock;
use std::io::{self, Write};
use std::process::ExitStatus;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by task commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Input validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// Task resolution failed.
    #[error(transparent)]
    Identity(#[from] TaskIdentityError),
    /// Session operation failed.
    #[error(transparent)]
    Session(#[from] SessionError),
    /// Store read failed.
    #[error(transparent)]
    Store(#[from] TaskStoreError),
    /// Note preparation failed.
    #[error(transparent)]
    Note(#[from] NoteError),
    /// Writing output failed.
    #[error("write output: {0}")]
    Output(#[from] io::Error),
    /// Encoding JSON output failed.
    #[error("encode json output: {0}")]
    Json(#[from] serde_json::Error),
    /// The editor could not be started.
    #[error("launch editor `{program}`: {source}")]
    EditorLaunch {
        /// Editor program.
        program: String,
        /// Spawn failure.
        #[source]
        source: io::Error,
    },
    /// The editor exited unsuccessfully.
    #[error("editor `{program}` exited with {status}")]
    EditorExit {
        /// Editor program.
        program: String,
        /// Exit status.
        status: ExitStatus,
    },
}

/// Wires the services behind the task commands.
pub struct App<S, P, C>
where
    S: TaskStore,
    P: PaneClient,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    identity: TaskIdentityService<S, C>,
    sessions: SessionService<S, P, C>,
    reports: ReportService<S>,
    notes: TaskNotes,
    editor: Option<String>,
}

impl<S, P, C> App<S, P, C>
where
    S: TaskStore,
    P: PaneClient,
    C: Clock + Send + Sync,
{
    /// Builds the services over shared adapters.
    #[must_use]
    pub fn new(store: Arc<S>, panes: Arc<P>, clock: Arc<C>, notes: TaskNotes) -> Self {
        Self {
            identity: TaskIdentityService::new(Arc::clone(&store), Arc::clone(&clock)),
            sessions: SessionService::new(Arc::clone(&store), panes, clock),
            reports: ReportService::new(Arc::clone(&store)),
            store,
            notes,
            editor: None,
        }
    }

    /// Sets the editor command line, usually taken from `$EDITOR`.
    #[must_use]
    pub fn with_editor(mut self, editor: Option<String>) -> Self {
        self.editor = editor;
        self
    }

    /// Runs one task command, writing its report to `out`.
    ///
    /// # Errors
    ///
    /// Returns the failing layer's error; nothing further is written once a
    /// command fails.
    pub async fn run(&self, command: TaskCommand, out: &mut impl Write) -> Result<(), CliError> {
        match command {
            TaskCommand::EnsurePrepr { repo, branch } => {
                self.ensure_pre_pr(&repo, &branch, out).await
            }
            TaskCommand::LinkPr { repo, branch, pr } => self.link_pr(&repo, &branch, pr, out).await,
            TaskCommand::List { group_by, json } => self.list(group_by, json, out).await,
            TaskCommand::Sessions {
                group_by,
                reconcile,
                json,
            } => self.list_sessions(group_by, reconcile, json, out).await,
            TaskCommand::OpenSession {
                selector,
                cwd,
                workspace,
                command: label,
            } => {
                let mut request = OpenSessionRequest::new(cwd, label);
                if let Some(name) = workspace {
                    request = request.with_workspace(name);
                }
                self.open_session(&selector, request, out).await
            }
            TaskCommand::CloseSession { selector } => self.close_session(&selector, out).await,
            TaskCommand::VerifySession { selector } => self.verify_session(&selector, out).await,
            TaskCommand::Dashboard { json } => self.dashboard(json, out).await,
            TaskCommand::EnsureNote { selector } => self.ensure_note(&selector, out).await,
            TaskCommand::OpenNote { selector, dry_run } => {
                self.open_note(&selector, dry_run, out).await
            }
        }
    }

    async fn ensure_pre_pr(
        &self,
        repo: &str,
        branch: &str,
        out: &mut impl Write,
    ) -> Result<(), CliError> {
        let ensured = self.identity.get_or_create_pre_pr_task(repo, branch).await?;
        let alias = AliasValue::pre_pr(&RepositoryName::new(repo)?, &BranchName::new(branch)?);
        let status = if ensured.created { "created" } else { "existing" };
        writeln!(
            out,
            "task_id={} status={status} prepr_alias={alias}",
            ensured.task.id()
        )?;
        Ok(())
    }

    async fn link_pr(
        &self,
        repo: &str,
        branch: &str,
        pr: u64,
        out: &mut impl Write,
    ) -> Result<(), CliError> {
        let linked = self.identity.link_pr_to_pre_pr(repo, branch, pr).await?;
        let repository = RepositoryName::new(repo)?;
        let pr_alias = AliasValue::pull_request(&repository, PullRequestNumber::new(pr)?);
        let pre_pr_alias = AliasValue::pre_pr(&repository, &BranchName::new(branch)?);
        writeln!(
            out,
            "task_id={} status={} pr_alias={pr_alias} prepr_alias={pre_pr_alias}",
            linked.task.id(),
            linked.status
        )?;
        Ok(())
    }

    async fn list(
        &self,
        group_by: Option<AliasGroupArg>,
        json: bool,
        out: &mut impl Write,
    ) -> Result<(), CliError> {
        if let Some(grouping) = group_by {
            let groups = self.store.alias_group_counts(grouping.into()).await?;
            return output::write_groups(out, &groups, json, "no tasks");
        }
        let aliases = self.store.list_aliases().await?;
        output::write_aliases(out, &aliases, json)
    }

    async fn list_sessions(
        &self,
        group_by: Option<SessionGroupArg>,
        reconcile: bool,
        json: bool,
        out: &mut impl Write,
    ) -> Result<(), CliError> {
        if reconcile {
            self.sessions.reconcile_all().await?;
        }
        if let Some(SessionGroupArg::Status) = group_by {
            let groups = self.store.session_status_counts().await?;
            return output::write_groups(out, &groups, json, "no sessions");
        }
        let sessions = self.store.list_sessions().await?;
        output::write_sessions(out, &sessions, json)
    }

    async fn open_session(
        &self,
        selector: &SelectorArgs,
        request: OpenSessionRequest,
        out: &mut impl Write,
    ) -> Result<(), CliError> {
        let task = self.identity.resolve(&selector.to_selector()).await?;
        let opened = self.sessions.open_session(task.id(), request).await?;
        writeln!(
            out,
            "task_id={} status={} pane_id={} workspace={}",
            task.id(),
            opened.action,
            output::pane_column(&opened.session),
            opened.session.workspace()
        )?;
        Ok(())
    }

    async fn close_session(
        &self,
        selector: &SelectorArgs,
        out: &mut impl Write,
    ) -> Result<(), CliError> {
        let task = self.identity.resolve(&selector.to_selector()).await?;
        match self.sessions.close_session(task.id()).await? {
            CloseOutcome::Missing => writeln!(out, "task_id={} status=missing", task.id())?,
            CloseOutcome::Closed(session) => writeln!(
                out,
                "task_id={} status=closed workspace={}",
                task.id(),
                session.workspace()
            )?,
        }
        Ok(())
    }

    async fn verify_session(
        &self,
        selector: &SelectorArgs,
        out: &mut impl Write,
    ) -> Result<(), CliError> {
        let task = self.identity.resolve(&selector.to_selector()).await?;
        match self.sessions.reconcile_session(task.id()).await? {
            None => writeln!(out, "task_id={} status=missing", task.id())?,
            Some(session) => writeln!(
                out,
                "task_id={} status={} pane_id={}",
                task.id(),
                session.status(),
                output::pane_column(&session)
            )?,
        }
        Ok(())
    }

    async fn dashboard(&self, json: bool, out: &mut impl Write) -> Result<(), CliError> {
        let dashboard = self.reports.dashboard().await?;
        if json {
            return output::write_json(out, &dashboard);
        }
        writeln!(out, "{}", dashboard.summary_line())?;
        Ok(())
    }

    async fn ensure_note(
        &self,
        selector: &SelectorArgs,
        out: &mut impl Write,
    ) -> Result<(), CliError> {
        let task = self.identity.resolve(&selector.to_selector()).await?;
        let note = self.notes.ensure(task.id())?;
        let status = if note.created { "created" } else { "existing" };
        writeln!(
            out,
            "task_id={} status={status} note_path={}",
            task.id(),
            note.path
        )?;
        Ok(())
    }

    async fn open_note(
        &self,
        selector: &SelectorArgs,
        dry_run: bool,
        out: &mut impl Write,
    ) -> Result<(), CliError> {
        let task = self.identity.resolve(&selector.to_selector()).await?;
        let note = self.notes.ensure(task.id())?;
        let editor = resolve_editor_command(self.editor.as_deref(), &note.path);
        if dry_run {
            writeln!(
                out,
                "task_id={} status=dry_run note_path={} command={editor}",
                task.id(),
                note.path
            )?;
            return Ok(());
        }

        let status = tokio::process::Command::new(editor.program())
            .args(editor.args())
            .status()
            .await
            .map_err(|source| CliError::EditorLaunch {
                program: editor.program().to_owned(),
                source,
            })?;
        if !status.success() {
            return Err(CliError::EditorExit {
                program: editor.program().to_owned(),
                status,
            });
        }
        writeln!(
            out,
            "task_id={} status=opened note_path={} editor={}",
            task.id(),
            note.path,
            editor.program()
        )?;
        Ok(())
    }
}
