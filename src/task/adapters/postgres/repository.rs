//! `PostgreSQL` repository implementation for task storage.

use super::{
    models::{NewTaskRow, TaskRow},
    schema::tasks,
};
use crate::task::{
    domain::{NewTask, PersistedTaskData, Task, TaskDate, TaskId, TaskStatus, TaskUpdate},
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::exists;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// `PostgreSQL` connection pool type used by task adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

/// Partial unique index over active tasks, see the `create_tasks` migration.
const ACTIVE_UNIQUE_INDEX: &str = "idx_tasks_active_title_date_unique";

/// Message `PostgreSQL` reports when `statement_timeout` cancels a query.
const STATEMENT_TIMEOUT_MESSAGE: &str = "canceling statement due to statement timeout";

/// `PostgreSQL`-backed task repository.
///
/// Every call runs in its own transaction. With a deadline set, the pool
/// checkout, each statement and the commit must all fit inside it; a call
/// that runs out of time is rolled back and reports
/// [`TaskRepositoryError::DeadlineExceeded`].
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: TaskPgPool,
    deadline: Option<Duration>,
}

/// Point in time by which a single repository call must finish.
#[derive(Debug, Clone, Copy)]
struct Deadline {
    limit: Duration,
    expires_at: Instant,
}

impl Deadline {
    fn starting_now(limit: Duration) -> Self {
        Self {
            limit,
            expires_at: Instant::now() + limit,
        }
    }

    const fn exceeded(self) -> TaskRepositoryError {
        TaskRepositoryError::DeadlineExceeded(self.limit)
    }

    /// Time left, or the deadline error once none is.
    fn remaining(self) -> TaskRepositoryResult<Duration> {
        self.expires_at
            .checked_duration_since(Instant::now())
            .filter(|left| !left.is_zero())
            .ok_or_else(|| self.exceeded())
    }
}

/// Failure inside a repository transaction.
enum TransactionError {
    Repository(TaskRepositoryError),
    Database(DieselError),
}

type TransactionResult<T> = Result<T, TransactionError>;

impl TransactionError {
    fn into_repository_error(self, deadline: Option<Deadline>) -> TaskRepositoryError {
        match self {
            Self::Repository(err) => err,
            Self::Database(err) => map_database_error(err, deadline),
        }
    }
}

impl From<DieselError> for TransactionError {
    fn from(err: DieselError) -> Self {
        Self::Database(err)
    }
}

impl From<TaskRepositoryError> for TransactionError {
    fn from(err: TaskRepositoryError) -> Self {
        Self::Repository(err)
    }
}

impl PostgresTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self {
            pool,
            deadline: None,
        }
    }

    /// Bounds every call by `deadline`, measured from the moment the call
    /// is made.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TransactionResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        let deadline = self.deadline.map(Deadline::starting_now);
        tokio::task::spawn_blocking(move || {
            let mut pooled = checkout(&pool, deadline)?;
            let connection: &mut PgConnection = &mut pooled;
            connection
                .transaction::<T, TransactionError, _>(|conn| {
                    if let Some(bound) = deadline {
                        limit_statements(conn, bound.remaining()?)?;
                    }
                    let value = f(conn)?;
                    // An error here rolls the transaction back.
                    if let Some(bound) = deadline {
                        bound.remaining()?;
                    }
                    Ok(value)
                })
                .map_err(|err| err.into_repository_error(deadline))
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }
}

fn checkout(
    pool: &TaskPgPool,
    deadline: Option<Deadline>,
) -> TaskRepositoryResult<PooledConnection<ConnectionManager<PgConnection>>> {
    let Some(bound) = deadline else {
        return pool.get().map_err(TaskRepositoryError::persistence);
    };
    pool.get_timeout(bound.remaining()?)
        .map_err(|_| bound.exceeded())
}

/// Caps every statement in the current transaction at `left`.
fn limit_statements(connection: &mut PgConnection, left: Duration) -> Result<(), DieselError> {
    let millis = left.as_millis().max(1);
    diesel::sql_query(format!("SET LOCAL statement_timeout = {millis}"))
        .execute(connection)
        .map(drop)
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn create(&self, task: &NewTask) -> TaskRepositoryResult<TaskId> {
        let key = DuplicateKey {
            title: task.title().as_str().to_owned(),
            active_at: task.active_at().to_timestamp(),
            status: task.status(),
        };
        let new_row = NewTaskRow {
            id: Uuid::new_v4(),
            title: key.title.clone(),
            active_at: key.active_at,
            status: key.status.as_str().to_owned(),
        };

        self.run_blocking(move |connection| {
            // The partial unique index still guards active tasks in the window
            // between this check and the insert.
            if duplicate_exists(connection, &key, None)? {
                return Err(key.already_exists().into());
            }

            diesel::insert_into(tasks::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| map_write_error(err, &key))?;

            Ok(TaskId::from_uuid(new_row.id))
        })
        .await
    }

    async fn list(
        &self,
        status: TaskStatus,
        as_of: DateTime<Utc>,
    ) -> TaskRepositoryResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let mut query = tasks::table
                .select(TaskRow::as_select())
                .filter(tasks::status.eq(status.as_str()))
                .into_boxed();
            if status == TaskStatus::Active {
                query = query.filter(tasks::active_at.le(as_of));
            }

            let rows = query
                .order(tasks::active_at.asc())
                .load::<TaskRow>(connection)?;
            let listed = rows
                .into_iter()
                .map(row_to_task)
                .collect::<TaskRepositoryResult<Vec<_>>>()?;
            Ok(listed)
        })
        .await
    }

    async fn update(&self, update: &TaskUpdate) -> TaskRepositoryResult<()> {
        let id = decode_id(update.id())?;
        let key = DuplicateKey {
            title: update.title().as_str().to_owned(),
            active_at: update.active_at().to_timestamp(),
            status: update.status(),
        };

        self.run_blocking(move |connection| {
            if duplicate_exists(connection, &key, Some(id))? {
                return Err(key.already_exists().into());
            }

            let matched = diesel::update(tasks::table.find(id))
                .set((
                    tasks::title.eq(key.title.as_str()),
                    tasks::active_at.eq(key.active_at),
                ))
                .execute(connection)
                .map_err(|err| map_write_error(err, &key))?;
            if matched == 0 {
                return Err(TaskRepositoryError::NotFound(TaskId::from_uuid(id)).into());
            }
            Ok(())
        })
        .await
    }

    async fn mark_done(&self, id: &str) -> TaskRepositoryResult<()> {
        let uuid = decode_id(id)?;
        self.run_blocking(move |connection| {
            let matched = diesel::update(tasks::table.find(uuid))
                .set(tasks::status.eq(TaskStatus::Done.as_str()))
                .execute(connection)?;
            if matched == 0 {
                return Err(TaskRepositoryError::NotFound(TaskId::from_uuid(uuid)).into());
            }
            Ok(())
        })
        .await
    }

    async fn delete(&self, id: &str) -> TaskRepositoryResult<()> {
        let uuid = decode_id(id)?;
        self.run_blocking(move |connection| {
            let deleted = diesel::delete(tasks::table.find(uuid)).execute(connection)?;
            if deleted == 0 {
                return Err(TaskRepositoryError::NotFound(TaskId::from_uuid(uuid)).into());
            }
            Ok(())
        })
        .await
    }
}

fn decode_id(id: &str) -> TaskRepositoryResult<Uuid> {
    TaskId::parse(id)
        .map(TaskId::into_inner)
        .map_err(|_| TaskRepositoryError::InvalidId(id.to_owned()))
}

fn row_to_task(row: TaskRow) -> TaskRepositoryResult<Task> {
    let TaskRow {
        id,
        title,
        active_at,
        status: persisted_status,
    } = row;

    let status = TaskStatus::try_from(persisted_status.as_str())
        .map_err(TaskRepositoryError::persistence)?;

    Ok(Task::from_persisted(PersistedTaskData {
        id: TaskId::from_uuid(id),
        title,
        active_at: TaskDate::from_timestamp(active_at),
        status,
    }))
}

/// Answers whether a task other than `excluding` holds the duplicate key,
/// without loading the matching row.
fn duplicate_exists(
    connection: &mut PgConnection,
    key: &DuplicateKey,
    excluding: Option<Uuid>,
) -> Result<bool, DieselError> {
    let matching = tasks::table
        .filter(tasks::title.eq(key.title.as_str()))
        .filter(tasks::active_at.eq(key.active_at))
        .filter(tasks::status.eq(key.status.as_str()));

    match excluding {
        Some(id) => diesel::select(exists(matching.filter(tasks::id.ne(id))))
            .get_result::<bool>(connection),
        None => diesel::select(exists(matching)).get_result::<bool>(connection),
    }
}

fn is_active_unique_violation(info: &dyn DatabaseErrorInformation) -> bool {
    info.constraint_name()
        .is_some_and(|name| name == ACTIVE_UNIQUE_INDEX)
}

fn map_write_error(err: DieselError, key: &DuplicateKey) -> TransactionError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
            if is_active_unique_violation(info.as_ref()) =>
        {
            key.already_exists().into()
        }
        _ => err.into(),
    }
}

fn is_statement_timeout(info: &dyn DatabaseErrorInformation) -> bool {
    info.message().contains(STATEMENT_TIMEOUT_MESSAGE)
}

/// Reports a statement cancelled by our own deadline as
/// [`TaskRepositoryError::DeadlineExceeded`]; anything else is a
/// persistence failure.
fn map_database_error(err: DieselError, deadline: Option<Deadline>) -> TaskRepositoryError {
    let timed_out = matches!(
        &err,
        DieselError::DatabaseError(_, info) if is_statement_timeout(info.as_ref())
    );
    match deadline {
        Some(bound) if timed_out => bound.exceeded(),
        _ => TaskRepositoryError::persistence(err),
    }
}
