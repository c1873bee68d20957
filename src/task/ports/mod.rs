//! Port contracts for task identity and session tracking.
//!
//! Ports define infrastructure-agnostic interfaces used by task services.

pub mod pane;
pub mod store;

pub use pane::{PaneClient, PaneClientError, PaneClientResult};
pub use store::{
    AliasGrouping, GroupCount, TaskStore, TaskStoreError, TaskStoreResult, sort_group_counts,
};
