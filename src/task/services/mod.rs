//! Application services for task identity, sessions and reporting.

mod identity;
mod report;
mod session;

pub use identity::{
    EnsuredTask, LinkStatus, LinkedTask, TaskIdentityError, TaskIdentityResult,
    TaskIdentityService, TaskSelector,
};
pub use report::{Dashboard, DashboardGroups, ReportService, TaskOverview, merge_task_overviews};
pub use session::{
    CloseOutcome, OpenAction, OpenSessionRequest, OpenedSession, ReconcileReport, SessionError,
    SessionResult, SessionService, SessionStatusChange,
};
