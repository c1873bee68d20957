//! Domain model for task identity and session tracking.
//!
//! Tasks are durable records addressed through aliases derived from a
//! repository branch or a pull request number. Sessions bind a task to a
//! terminal pane. Infrastructure concerns stay outside this boundary.

mod alias;
mod error;
mod ids;
mod pane;
mod session;
mod task;

pub use alias::{AliasKind, AliasValue, PersistedAliasData, TaskAlias};
pub use error::{ParseAliasKindError, ParseSessionStatusError, TaskDomainError};
pub use ids::{BranchName, PullRequestNumber, RepositoryName, TaskId};
pub use pane::{LivePanes, Pane, PaneId};
pub use session::{PersistedSessionData, Session, SessionLaunch, SessionStatus, WorkspaceName};
pub use task::{PersistedTaskData, Task};
