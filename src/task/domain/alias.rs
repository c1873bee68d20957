//! Aliases: deterministic external names bound to exactly one task.

use super::{BranchName, ParseAliasKindError, PullRequestNumber, RepositoryName, TaskId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The workflow stage an alias was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AliasKind {
    /// Derived from a repository and branch before a pull request exists.
    #[serde(rename = "prepr")]
    PrePr,
    /// Derived from a repository and pull request number.
    #[serde(rename = "pr")]
    PullRequest,
}

impl AliasKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PrePr => "prepr",
            Self::PullRequest => "pr",
        }
    }
}

impl TryFrom<&str> for AliasKind {
    type Error = ParseAliasKindError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "prepr" | "pre-pr" => Ok(Self::PrePr),
            "pr" => Ok(Self::PullRequest),
            _ => Err(ParseAliasKindError(value.to_owned())),
        }
    }
}

impl fmt::Display for AliasKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Globally unique alias string.
///
/// Values are built deterministically from normalised inputs:
/// `prepr:<repo>:<branch>` for pre-PR aliases and `pr:<repo>#<number>` for
/// pull request aliases.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasValue(String);

impl AliasValue {
    /// Builds the pre-PR alias for a repository branch.
    #[must_use]
    pub fn pre_pr(repository: &RepositoryName, branch: &BranchName) -> Self {
        Self(format!("prepr:{repository}:{branch}"))
    }

    /// Builds the pull request alias for a repository.
    #[must_use]
    pub fn pull_request(repository: &RepositoryName, number: PullRequestNumber) -> Self {
        Self(format!("pr:{repository}#{number}"))
    }

    /// Wraps an alias value read back from storage.
    #[must_use]
    pub fn from_persisted(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the alias as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for AliasValue {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for AliasValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An alias row binding an [`AliasValue`] to its owning task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskAlias {
    value: AliasValue,
    kind: AliasKind,
    task_id: TaskId,
    repository: RepositoryName,
    branch: Option<BranchName>,
    pr_number: Option<PullRequestNumber>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedAliasData {
    /// Persisted alias value.
    pub value: AliasValue,
    /// Persisted alias kind.
    pub kind: AliasKind,
    /// Owning task identifier.
    pub task_id: TaskId,
    /// Normalised repository.
    pub repository: RepositoryName,
    /// Branch, when known.
    pub branch: Option<BranchName>,
    /// Pull request number, for pull request aliases.
    pub pr_number: Option<PullRequestNumber>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl TaskAlias {
    /// Creates the pre-PR alias binding `repository`/`branch` to a task.
    #[must_use]
    pub fn pre_pr(
        task_id: TaskId,
        repository: RepositoryName,
        branch: BranchName,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            value: AliasValue::pre_pr(&repository, &branch),
            kind: AliasKind::PrePr,
            task_id,
            repository,
            branch: Some(branch),
            pr_number: None,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Creates the pull request alias binding `repository`#`number` to a task.
    ///
    /// The branch is recorded as metadata when the caller knows it.
    #[must_use]
    pub fn pull_request(
        task_id: TaskId,
        repository: RepositoryName,
        branch: Option<BranchName>,
        number: PullRequestNumber,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            value: AliasValue::pull_request(&repository, number),
            kind: AliasKind::PullRequest,
            task_id,
            repository,
            branch,
            pr_number: Some(number),
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs an alias from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedAliasData) -> Self {
        Self {
            value: data.value,
            kind: data.kind,
            task_id: data.task_id,
            repository: data.repository,
            branch: data.branch,
            pr_number: data.pr_number,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Carries over the creation timestamp of the row being refreshed.
    #[must_use]
    pub(crate) fn with_created_at(self, created_at: DateTime<Utc>) -> Self {
        Self { created_at, ..self }
    }

    /// Returns the alias value.
    #[must_use]
    pub const fn value(&self) -> &AliasValue {
        &self.value
    }

    /// Returns the alias kind.
    #[must_use]
    pub const fn kind(&self) -> AliasKind {
        self.kind
    }

    /// Returns the owning task identifier.
    #[must_use]
    pub const fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// Returns the normalised repository.
    #[must_use]
    pub const fn repository(&self) -> &RepositoryName {
        &self.repository
    }

    /// Returns the branch, if recorded.
    #[must_use]
    pub const fn branch(&self) -> Option<&BranchName> {
        self.branch.as_ref()
    }

    /// Returns the pull request number, if this is a pull request alias.
    #[must_use]
    pub const fn pr_number(&self) -> Option<PullRequestNumber> {
        self.pr_number
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
