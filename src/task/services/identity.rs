//! Service layer resolving branch and pull request aliases to tasks.

use crate::task::{
    domain::{
        AliasValue, BranchName, PullRequestNumber, RepositoryName, Task, TaskAlias,
        TaskDomainError,
    },
    ports::{TaskStore, TaskStoreError},
};
use mockable::Clock;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Outcome of [`TaskIdentityService::get_or_create_pre_pr_task`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsuredTask {
    /// The task bound to the pre-PR alias.
    pub task: Task,
    /// Whether this call created the task.
    pub created: bool,
}

/// How [`TaskIdentityService::link_pr_to_pre_pr`] resolved the pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    /// The pull request alias already named a task; nothing was written.
    AlreadyLinked,
    /// The pull request alias was bound to the task of the pre-PR alias.
    LinkedExistingPrepr,
    /// No alias existed; a new task was created for the pull request alone.
    CreatedFromPr,
}

impl LinkStatus {
    /// Returns the status label used in command output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AlreadyLinked => "already_linked",
            Self::LinkedExistingPrepr => "linked_existing_prepr",
            Self::CreatedFromPr => "created_from_pr",
        }
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of [`TaskIdentityService::link_pr_to_pre_pr`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedTask {
    /// The task the pull request alias names.
    pub task: Task,
    /// Which linking path was taken.
    pub status: LinkStatus,
}

/// Identifies a task by repository plus branch, pull request, or both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSelector {
    repository: String,
    branch: Option<String>,
    pr_number: Option<u64>,
}

impl TaskSelector {
    /// Creates a selector for `repository` with no branch or pull request.
    #[must_use]
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            branch: None,
            pr_number: None,
        }
    }

    /// Sets the branch. Blank branches are ignored.
    #[must_use]
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        let value = branch.into();
        self.branch = (!value.trim().is_empty()).then_some(value);
        self
    }

    /// Sets the pull request number. Zero is ignored.
    #[must_use]
    pub fn with_pull_request(mut self, pr_number: u64) -> Self {
        self.pr_number = (pr_number != 0).then_some(pr_number);
        self
    }
}

/// Service-level errors for task identity operations.
#[derive(Debug, Error)]
pub enum TaskIdentityError {
    /// Input validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// Store operation failed.
    #[error(transparent)]
    Store(#[from] TaskStoreError),
    /// A pull request was selected without a branch and no task is bound to
    /// it yet.
    #[error("no task found for {0}; link it to a branch first")]
    UnlinkedPullRequest(AliasValue),
    /// Neither a branch nor a pull request number was selected.
    #[error("a branch or pull request number is required")]
    MissingSelector,
}

/// Result type for task identity service operations.
pub type TaskIdentityResult<T> = Result<T, TaskIdentityError>;

/// Resolves aliases to tasks, creating and linking them on demand.
#[derive(Clone)]
pub struct TaskIdentityService<S, C>
where
    S: TaskStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
}

impl<S, C> TaskIdentityService<S, C>
where
    S: TaskStore,
    C: Clock + Send + Sync,
{
    /// Creates a new task identity service.
    #[must_use]
    pub const fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self { store, clock }
    }

    /// Returns the task bound to the pre-PR alias of `repository`/`branch`,
    /// creating it when absent.
    ///
    /// Repeated calls with equivalent inputs return the same task; only the
    /// first reports `created`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskIdentityError::Domain`] for blank inputs and
    /// [`TaskIdentityError::Store`] when persistence fails, including
    /// [`TaskStoreError::AliasAlreadyBound`] when a concurrent caller bound
    /// the alias first.
    pub async fn get_or_create_pre_pr_task(
        &self,
        repository: &str,
        branch: &str,
    ) -> TaskIdentityResult<EnsuredTask> {
        let repository_name = RepositoryName::new(repository)?;
        let branch_name = BranchName::new(branch)?;
        let alias = AliasValue::pre_pr(&repository_name, &branch_name);

        if let Some(task) = self.store.find_task_by_alias(&alias).await? {
            tracing::debug!(%alias, task_id = %task.id(), "pre-PR alias already bound");
            return Ok(EnsuredTask {
                task,
                created: false,
            });
        }

        let task = Task::allocate(&*self.clock);
        let row = TaskAlias::pre_pr(task.id().clone(), repository_name, branch_name, &*self.clock);
        self.store.create_task_with_alias(&task, &row).await?;
        tracing::info!(%alias, task_id = %task.id(), "created task for pre-PR alias");
        Ok(EnsuredTask {
            task,
            created: true,
        })
    }

    /// Binds the pull request alias of `repository`#`pr_number` to a task.
    ///
    /// An existing pull request alias wins; otherwise the pull request joins
    /// the task of the pre-PR alias for `branch`; otherwise a new task is
    /// created carrying only the pull request alias.
    ///
    /// # Errors
    ///
    /// Returns [`TaskIdentityError::Domain`] for invalid inputs and
    /// [`TaskIdentityError::Store`] when persistence fails.
    pub async fn link_pr_to_pre_pr(
        &self,
        repository: &str,
        branch: &str,
        pr_number: u64,
    ) -> TaskIdentityResult<LinkedTask> {
        let repository_name = RepositoryName::new(repository)?;
        let branch_name = BranchName::new(branch)?;
        let number = PullRequestNumber::new(pr_number)?;
        let pr_alias = AliasValue::pull_request(&repository_name, number);

        if let Some(task) = self.store.find_task_by_alias(&pr_alias).await? {
            tracing::debug!(alias = %pr_alias, task_id = %task.id(), "pull request already linked");
            return Ok(LinkedTask {
                task,
                status: LinkStatus::AlreadyLinked,
            });
        }

        let pre_pr_alias = AliasValue::pre_pr(&repository_name, &branch_name);
        if let Some(task) = self.store.find_task_by_alias(&pre_pr_alias).await? {
            let row = TaskAlias::pull_request(
                task.id().clone(),
                repository_name,
                Some(branch_name),
                number,
                &*self.clock,
            );
            self.store.upsert_alias(&row).await?;
            tracing::info!(
                alias = %pr_alias,
                pre_pr_alias = %pre_pr_alias,
                task_id = %task.id(),
                "linked pull request to pre-PR task"
            );
            return Ok(LinkedTask {
                task,
                status: LinkStatus::LinkedExistingPrepr,
            });
        }

        let task = Task::allocate(&*self.clock);
        let row = TaskAlias::pull_request(
            task.id().clone(),
            repository_name,
            Some(branch_name),
            number,
            &*self.clock,
        );
        self.store.create_task_with_alias(&task, &row).await?;
        tracing::info!(alias = %pr_alias, task_id = %task.id(), "created task for pull request");
        Ok(LinkedTask {
            task,
            status: LinkStatus::CreatedFromPr,
        })
    }

    /// Looks up the task bound to `repository`#`pr_number`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskIdentityError::Domain`] for invalid inputs and
    /// [`TaskIdentityError::Store`] when the lookup fails.
    pub async fn get_task_by_pr(
        &self,
        repository: &str,
        pr_number: u64,
    ) -> TaskIdentityResult<Option<Task>> {
        let repository_name = RepositoryName::new(repository)?;
        let number = PullRequestNumber::new(pr_number)?;
        let alias = AliasValue::pull_request(&repository_name, number);
        Ok(self.store.find_task_by_alias(&alias).await?)
    }

    /// Looks up the task bound to the pre-PR alias of `repository`/`branch`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskIdentityError::Domain`] for blank inputs and
    /// [`TaskIdentityError::Store`] when the lookup fails.
    pub async fn get_task_by_pre_pr(
        &self,
        repository: &str,
        branch: &str,
    ) -> TaskIdentityResult<Option<Task>> {
        let repository_name = RepositoryName::new(repository)?;
        let branch_name = BranchName::new(branch)?;
        let alias = AliasValue::pre_pr(&repository_name, &branch_name);
        Ok(self.store.find_task_by_alias(&alias).await?)
    }

    /// Resolves a selector to a task.
    ///
    /// Branch and pull request link them; a branch alone gets or creates the
    /// pre-PR task; a pull request alone must already be linked.
    ///
    /// # Errors
    ///
    /// Returns [`TaskIdentityError::MissingSelector`] when the selector names
    /// neither, [`TaskIdentityError::UnlinkedPullRequest`] when a lone pull
    /// request has no task, and the errors of the delegated operation
    /// otherwise.
    pub async fn resolve(&self, selector: &TaskSelector) -> TaskIdentityResult<Task> {
        match (selector.branch.as_deref(), selector.pr_number) {
            (Some(branch), Some(pr_number)) => Ok(self
                .link_pr_to_pre_pr(&selector.repository, branch, pr_number)
                .await?
                .task),
            (Some(branch), None) => Ok(self
                .get_or_create_pre_pr_task(&selector.repository, branch)
                .await?
                .task),
            (None, Some(pr_number)) => {
                let found = self.get_task_by_pr(&selector.repository, pr_number).await?;
                found.ok_or_else(|| {
                    let repository = RepositoryName::new(&selector.repository);
                    let number = PullRequestNumber::new(pr_number);
                    match (repository, number) {
                        (Ok(repo), Ok(num)) => TaskIdentityError::UnlinkedPullRequest(
                            AliasValue::pull_request(&repo, num),
                        ),
                        (Err(err), _) | (_, Err(err)) => TaskIdentityError::Domain(err),
                    }
                })
            }
            (None, None) => Err(TaskIdentityError::MissingSelector),
        }
    }
}
