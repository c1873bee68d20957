//! `SQLite` store implementation for tasks, aliases and sessions.

use super::{
    models::{
        AliasChangeset, AliasRow, GroupCountRow, SessionChangeset, SessionRow, TaskRow,
    },
    schema::{sessions, task_aliases, tasks},
};
use crate::task::{
    domain::{
        AliasKind, AliasValue, BranchName, PaneId, PersistedAliasData, PersistedSessionData,
        PersistedTaskData, PullRequestNumber, RepositoryName, Session, SessionLaunch,
        SessionStatus, Task, TaskAlias, TaskId, WorkspaceName,
    },
    ports::{AliasGrouping, GroupCount, TaskStore, TaskStoreError, TaskStoreResult},
};
use async_trait::async_trait;
use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8::Dir};
use chrono::{DateTime, SecondsFormat, Utc};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sqlite::SqliteConnection;
use std::time::Duration;

/// `SQLite` connection pool type used by the task store.
pub type TaskSqlitePool = Pool<ConnectionManager<SqliteConnection>>;

/// Schema applied when a store is opened. Every statement is idempotent.
const SCHEMA_SQL: &str =
    include_str!("../../../../migrations/2026-10-19-000000_create_task_tables/up.sql");

/// Connections kept by a file-backed pool.
const MAX_CONNECTIONS: u32 = 4;

/// How long a connection waits on another writer before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// `SQLite`-backed task store.
///
/// Check-then-write operations run inside `BEGIN IMMEDIATE` transactions, so
/// concurrent processes sharing one database file serialise on the write lock
/// instead of interleaving between the check and the write.
#[derive(Debug, Clone)]
pub struct SqliteTaskStore {
    pool: TaskSqlitePool,
}

#[derive(Debug, Clone, Copy)]
struct ConnectionPragmas;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionPragmas {
    fn on_acquire(&self, connection: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        connection
            .batch_execute(&format!(
                "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = {};",
                BUSY_TIMEOUT.as_millis()
            ))
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

impl SqliteTaskStore {
    /// Creates a store from an existing pool. The schema is not applied.
    #[must_use]
    pub const fn new(pool: TaskSqlitePool) -> Self {
        Self { pool }
    }

    /// Opens the database file at `path`, creating it and its parent
    /// directories when missing, and applies the schema.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Persistence`] when the directory cannot be
    /// created, the pool cannot connect, or the schema cannot be applied.
    pub fn open(path: &Utf8Path) -> TaskStoreResult<Self> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) {
            Dir::create_ambient_dir_all(parent, ambient_authority())
                .map_err(TaskStoreError::persistence)?;
        }
        let pool = build_pool(path.as_str())?;
        let store = Self::new(pool);
        store.apply_schema("PRAGMA journal_mode = WAL;")?;
        Ok(store)
    }

    fn apply_schema(&self, prelude: &str) -> TaskStoreResult<()> {
        let mut connection = self.pool.get().map_err(TaskStoreError::persistence)?;
        connection.batch_execute(prelude)?;
        connection.batch_execute(SCHEMA_SQL)?;
        Ok(())
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskStoreResult<T>
    where
        F: FnOnce(&mut SqliteConnection) -> TaskStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskStoreError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskStoreError::persistence)?
    }
}

fn build_pool(database_url: &str) -> TaskStoreResult<TaskSqlitePool> {
    Pool::builder()
        .max_size(MAX_CONNECTIONS)
        .idle_timeout(None)
        .max_lifetime(None)
        .connection_customizer(Box::new(ConnectionPragmas))
        .build(ConnectionManager::<SqliteConnection>::new(database_url))
        .map_err(TaskStoreError::persistence)
}

impl From<DieselError> for TaskStoreError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    async fn create_task(&self, task: &Task) -> TaskStoreResult<()> {
        let row = task_to_row(task);
        self.run_blocking(move |connection| insert_task(connection, &row))
            .await
    }

    async fn create_task_with_alias(&self, task: &Task, alias: &TaskAlias) -> TaskStoreResult<()> {
        let task_row = task_to_row(task);
        let alias_row = alias_to_row(alias)?;
        self.run_blocking(move |connection| {
            connection.immediate_transaction(|tx| {
                if let Some(bound_to) = find_alias_owner(tx, &alias_row.alias_value)? {
                    return Err(TaskStoreError::AliasAlreadyBound {
                        alias: AliasValue::from_persisted(alias_row.alias_value.clone()),
                        bound_to,
                        requested: parse_task_id(alias_row.task_id.clone())?,
                    });
                }
                insert_task(tx, &task_row)?;
                ensure_task_exists(tx, &alias_row.task_id)?;
                diesel::insert_into(task_aliases::table)
                    .values(&alias_row)
                    .execute(tx)?;
                Ok(())
            })
        })
        .await
    }

    async fn find_task(&self, id: &TaskId) -> TaskStoreResult<Option<Task>> {
        let lookup_id = id.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = tasks::table
                .find(&lookup_id)
                .select(TaskRow::as_select())
                .first(connection)
                .optional()?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn find_task_by_alias(&self, alias: &AliasValue) -> TaskStoreResult<Option<Task>> {
        let lookup_alias = alias.as_str().to_owned();
        self.run_blocking(move |connection| {
            let found = task_aliases::table
                .left_join(tasks::table)
                .filter(task_aliases::alias_value.eq(&lookup_alias))
                .select((
                    task_aliases::task_id,
                    tasks::created_at.nullable(),
                    tasks::updated_at.nullable(),
                ))
                .first::<(String, Option<String>, Option<String>)>(connection)
                .optional()?;
            match found {
                None => Ok(None),
                Some((task_id, Some(created_at), Some(updated_at))) => row_to_task(TaskRow {
                    task_id,
                    created_at,
                    updated_at,
                })
                .map(Some),
                Some((task_id, _, _)) => Err(TaskStoreError::TaskNotFound(parse_task_id(task_id)?)),
            }
        })
        .await
    }

    async fn find_alias(&self, alias: &AliasValue) -> TaskStoreResult<Option<TaskAlias>> {
        let lookup_alias = alias.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = task_aliases::table
                .find(&lookup_alias)
                .select(AliasRow::as_select())
                .first(connection)
                .optional()?;
            row.map(row_to_alias).transpose()
        })
        .await
    }

    async fn upsert_alias(&self, alias: &TaskAlias) -> TaskStoreResult<()> {
        let row = alias_to_row(alias)?;
        self.run_blocking(move |connection| {
            connection.immediate_transaction(|tx| {
                if let Some(bound_to) = find_alias_owner(tx, &row.alias_value)? {
                    if bound_to.as_str() != row.task_id {
                        return Err(TaskStoreError::AliasAlreadyBound {
                            alias: AliasValue::from_persisted(row.alias_value.clone()),
                            bound_to,
                            requested: parse_task_id(row.task_id.clone())?,
                        });
                    }
                }
                ensure_task_exists(tx, &row.task_id)?;
                diesel::insert_into(task_aliases::table)
                    .values(&row)
                    .on_conflict(task_aliases::alias_value)
                    .do_update()
                    .set(AliasChangeset::from(&row))
                    .execute(tx)?;
                Ok(())
            })
        })
        .await
    }

    async fn upsert_session(&self, session: &Session) -> TaskStoreResult<()> {
        let row = session_to_row(session);
        self.run_blocking(move |connection| {
            connection.immediate_transaction(|tx| {
                ensure_task_exists(tx, &row.task_id)?;
                diesel::insert_into(sessions::table)
                    .values(&row)
                    .on_conflict(sessions::task_id)
                    .do_update()
                    .set(SessionChangeset::from(&row))
                    .execute(tx)?;
                Ok(())
            })
        })
        .await
    }

    async fn find_session(&self, task_id: &TaskId) -> TaskStoreResult<Option<Session>> {
        let lookup_id = task_id.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = sessions::table
                .find(&lookup_id)
                .select(SessionRow::as_select())
                .first(connection)
                .optional()?;
            row.map(row_to_session).transpose()
        })
        .await
    }

    async fn list_sessions(&self) -> TaskStoreResult<Vec<Session>> {
        self.run_blocking(|connection| {
            sessions::table
                .order((sessions::updated_at.desc(), sessions::task_id.asc()))
                .select(SessionRow::as_select())
                .load(connection)?
                .into_iter()
                .map(row_to_session)
                .collect()
        })
        .await
    }

    async fn list_tasks(&self) -> TaskStoreResult<Vec<Task>> {
        self.run_blocking(|connection| {
            tasks::table
                .order((tasks::updated_at.desc(), tasks::task_id.asc()))
                .select(TaskRow::as_select())
                .load(connection)?
                .into_iter()
                .map(row_to_task)
                .collect()
        })
        .await
    }

    async fn list_aliases(&self) -> TaskStoreResult<Vec<TaskAlias>> {
        self.run_blocking(|connection| {
            task_aliases::table
                .order((
                    task_aliases::updated_at.desc(),
                    task_aliases::alias_value.asc(),
                ))
                .select(AliasRow::as_select())
                .load(connection)?
                .into_iter()
                .map(row_to_alias)
                .collect()
        })
        .await
    }

    async fn alias_group_counts(
        &self,
        grouping: AliasGrouping,
    ) -> TaskStoreResult<Vec<GroupCount>> {
        let column = match grouping {
            AliasGrouping::Repository => "repo",
            AliasGrouping::AliasKind => "alias_type",
        };
        self.run_blocking(move |connection| {
            load_group_counts(connection, &grouped_count_sql("task_aliases", column))
        })
        .await
    }

    async fn session_status_counts(&self) -> TaskStoreResult<Vec<GroupCount>> {
        self.run_blocking(|connection| {
            load_group_counts(connection, &grouped_count_sql("sessions", "status"))
        })
        .await
    }
}

fn grouped_count_sql(table: &str, column: &str) -> String {
    format!(
        "SELECT COALESCE({column}, '') AS group_key, COUNT(*) AS group_count \
         FROM {table} GROUP BY group_key ORDER BY group_count DESC, group_key ASC"
    )
}

fn load_group_counts(
    connection: &mut SqliteConnection,
    sql: &str,
) -> TaskStoreResult<Vec<GroupCount>> {
    diesel::sql_query(sql)
        .load::<GroupCountRow>(connection)?
        .into_iter()
        .map(|row| {
            let count = u64::try_from(row.group_count).map_err(TaskStoreError::persistence)?;
            Ok(GroupCount::new(row.group_key, count))
        })
        .collect()
}

fn insert_task(connection: &mut SqliteConnection, row: &TaskRow) -> TaskStoreResult<()> {
    diesel::insert_into(tasks::table)
        .values(row)
        .execute(connection)
        .map_err(|err| match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                match TaskId::new(row.task_id.clone()) {
                    Ok(task_id) => TaskStoreError::DuplicateTask(task_id),
                    Err(parse_err) => TaskStoreError::persistence(parse_err),
                }
            }
            _ => TaskStoreError::persistence(err),
        })?;
    Ok(())
}

fn find_alias_owner(
    connection: &mut SqliteConnection,
    alias_value: &str,
) -> TaskStoreResult<Option<TaskId>> {
    let owner = task_aliases::table
        .find(alias_value)
        .select(task_aliases::task_id)
        .first::<String>(connection)
        .optional()?;
    owner.map(parse_task_id).transpose()
}

fn ensure_task_exists(connection: &mut SqliteConnection, task_id: &str) -> TaskStoreResult<()> {
    let found = tasks::table
        .find(task_id)
        .select(tasks::task_id)
        .first::<String>(connection)
        .optional()?;
    match found {
        Some(_) => Ok(()),
        None => Err(TaskStoreError::TaskNotFound(parse_task_id(task_id.to_owned())?)),
    }
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(value: &str) -> TaskStoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(TaskStoreError::persistence)
}

fn parse_task_id(value: String) -> TaskStoreResult<TaskId> {
    TaskId::new(value).map_err(TaskStoreError::persistence)
}

fn task_to_row(task: &Task) -> TaskRow {
    TaskRow {
        task_id: task.id().as_str().to_owned(),
        created_at: format_timestamp(task.created_at()),
        updated_at: format_timestamp(task.updated_at()),
    }
}

fn row_to_task(row: TaskRow) -> TaskStoreResult<Task> {
    Ok(Task::from_persisted(PersistedTaskData {
        id: parse_task_id(row.task_id)?,
        created_at: parse_timestamp(&row.created_at)?,
        updated_at: parse_timestamp(&row.updated_at)?,
    }))
}

fn alias_to_row(alias: &TaskAlias) -> TaskStoreResult<AliasRow> {
    let pr_number = alias
        .pr_number()
        .map(|number| i64::try_from(number.value()))
        .transpose()
        .map_err(TaskStoreError::persistence)?;
    Ok(AliasRow {
        alias_value: alias.value().as_str().to_owned(),
        task_id: alias.task_id().as_str().to_owned(),
        alias_type: alias.kind().as_str().to_owned(),
        repo: Some(alias.repository().as_str().to_owned()),
        branch: alias.branch().map(|branch| branch.as_str().to_owned()),
        pr_number,
        created_at: format_timestamp(alias.created_at()),
        updated_at: format_timestamp(alias.updated_at()),
    })
}

fn row_to_alias(row: AliasRow) -> TaskStoreResult<TaskAlias> {
    let kind = AliasKind::try_from(row.alias_type.as_str()).map_err(TaskStoreError::persistence)?;
    let repository =
        RepositoryName::new(row.repo.unwrap_or_default()).map_err(TaskStoreError::persistence)?;
    let branch = row
        .branch
        .filter(|value| !value.trim().is_empty())
        .map(BranchName::new)
        .transpose()
        .map_err(TaskStoreError::persistence)?;
    let pr_number = row
        .pr_number
        .filter(|value| *value > 0)
        .map(|value| {
            let unsigned = u64::try_from(value).map_err(TaskStoreError::persistence)?;
            PullRequestNumber::new(unsigned).map_err(TaskStoreError::persistence)
        })
        .transpose()?;
    Ok(TaskAlias::from_persisted(PersistedAliasData {
        value: AliasValue::from_persisted(row.alias_value),
        kind,
        task_id: parse_task_id(row.task_id)?,
        repository,
        branch,
        pr_number,
        created_at: parse_timestamp(&row.created_at)?,
        updated_at: parse_timestamp(&row.updated_at)?,
    }))
}

fn session_to_row(session: &Session) -> SessionRow {
    let launch = session.launch();
    SessionRow {
        task_id: session.task_id().as_str().to_owned(),
        workspace: launch.workspace().as_str().to_owned(),
        pane_id: session.pane_id().map_or(0, PaneId::value),
        cwd: launch.cwd().to_owned(),
        command: launch.command().to_owned(),
        status: session.status().as_str().to_owned(),
        external_session_label: session
            .external_session_label()
            .unwrap_or_default()
            .to_owned(),
        last_seen_at: format_timestamp(session.last_seen_at()),
        created_at: format_timestamp(session.created_at()),
        updated_at: format_timestamp(session.updated_at()),
    }
}

fn row_to_session(row: SessionRow) -> TaskStoreResult<Session> {
    let workspace = WorkspaceName::new(&row.workspace).map_err(TaskStoreError::persistence)?;
    let status =
        SessionStatus::try_from(row.status.as_str()).map_err(TaskStoreError::persistence)?;
    let label = row.external_session_label.trim();
    Ok(Session::from_persisted(PersistedSessionData {
        task_id: parse_task_id(row.task_id.clone())?,
        launch: SessionLaunch::new(workspace, row.cwd.clone(), row.command.clone()),
        pane_id: PaneId::bound(row.pane_id),
        status,
        external_session_label: (!label.is_empty()).then(|| label.to_owned()),
        last_seen_at: parse_timestamp(&row.last_seen_at)?,
        created_at: parse_timestamp(&row.created_at)?,
        updated_at: parse_timestamp(&row.updated_at)?,
    }))
}
