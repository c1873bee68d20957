//! Diesel row models for task persistence.

use super::schema::{sessions, task_aliases, tasks};
use diesel::prelude::*;

/// Task row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TaskRow {
    /// Task identifier.
    pub task_id: String,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

/// Alias row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = task_aliases)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AliasRow {
    /// Alias string.
    pub alias_value: String,
    /// Owning task identifier.
    pub task_id: String,
    /// Alias kind.
    pub alias_type: String,
    /// Repository, `NULL` when empty.
    pub repo: Option<String>,
    /// Branch, `NULL` when empty.
    pub branch: Option<String>,
    /// Pull request number, `NULL` for pre-PR aliases.
    pub pr_number: Option<i64>,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

/// Columns refreshed when an existing alias row is upserted.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = task_aliases)]
#[diesel(treat_none_as_null = true)]
pub struct AliasChangeset {
    /// Alias kind.
    pub alias_type: String,
    /// Repository.
    pub repo: Option<String>,
    /// Branch.
    pub branch: Option<String>,
    /// Pull request number.
    pub pr_number: Option<i64>,
    /// Last update timestamp.
    pub updated_at: String,
}

impl From<&AliasRow> for AliasChangeset {
    fn from(row: &AliasRow) -> Self {
        Self {
            alias_type: row.alias_type.clone(),
            repo: row.repo.clone(),
            branch: row.branch.clone(),
            pr_number: row.pr_number,
            updated_at: row.updated_at.clone(),
        }
    }
}

/// Session row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = sessions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SessionRow {
    /// Owning task identifier.
    pub task_id: String,
    /// Workspace.
    pub workspace: String,
    /// Pane identifier, `0` when unbound.
    pub pane_id: i64,
    /// Working directory.
    pub cwd: String,
    /// Command label.
    pub command: String,
    /// Session status.
    pub status: String,
    /// External session label, empty when unset.
    pub external_session_label: String,
    /// Last-seen timestamp.
    pub last_seen_at: String,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

/// Columns refreshed when an existing session row is upserted.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = sessions)]
pub struct SessionChangeset {
    /// Workspace.
    pub workspace: String,
    /// Pane identifier.
    pub pane_id: i64,
    /// Working directory.
    pub cwd: String,
    /// Command label.
    pub command: String,
    /// Session status.
    pub status: String,
    /// External session label.
    pub external_session_label: String,
    /// Last-seen timestamp.
    pub last_seen_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

impl From<&SessionRow> for SessionChangeset {
    fn from(row: &SessionRow) -> Self {
        Self {
            workspace: row.workspace.clone(),
            pane_id: row.pane_id,
            cwd: row.cwd.clone(),
            command: row.command.clone(),
            status: row.status.clone(),
            external_session_label: row.external_session_label.clone(),
            last_seen_at: row.last_seen_at.clone(),
            updated_at: row.updated_at.clone(),
        }
    }
}

/// Result row of a grouped count query.
#[derive(Debug, Clone, QueryableByName)]
pub struct GroupCountRow {
    /// Group key, `''` for `NULL`.
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub group_key: String,
    /// Rows in the group.
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub group_count: i64,
}
