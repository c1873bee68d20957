//! Error types for task domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing domain task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task identifier is empty after trimming.
    #[error("task identifier must not be empty")]
    EmptyTaskId,

    /// The repository name is empty after trimming.
    #[error("repository must not be empty")]
    EmptyRepository,

    /// The branch name is empty after trimming.
    #[error("branch must not be empty")]
    EmptyBranch,

    /// The pull request number is invalid.
    #[error("invalid pull request number {0}, expected a positive integer")]
    InvalidPullRequestNumber(u64),

    /// The workspace name is empty after trimming.
    #[error("workspace must not be empty")]
    EmptyWorkspace,
}

/// Error returned while parsing alias kinds from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown alias kind: {0}")]
pub struct ParseAliasKindError(pub String);

/// Error returned while parsing session statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown session status: {0}")]
pub struct ParseSessionStatusError(pub String);
