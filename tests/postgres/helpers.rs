//! Shared helpers for `PostgreSQL` integration tests.

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use todo_list::task::adapters::postgres::{PostgresTaskRepository, TaskPgPool};
use uuid::Uuid;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Environment variable naming the admin connection URL.
pub const TEST_DATABASE_URL_ENV: &str = "TODO_LIST_TEST_DATABASE_URL";

/// SQL creating the tasks schema.
pub const CREATE_TASKS_SQL: &str =
    include_str!("../../migrations/2026-10-19-000000_create_tasks/up.sql");

/// Database created for one test and dropped when this value is dropped.
pub struct TemporaryDatabase {
    admin_url: String,
    name: String,
    url: String,
}

impl TemporaryDatabase {
    /// Creates and migrates a uniquely named database.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the connection, the database
    /// cannot be created, or the migration fails.
    pub fn create(admin_url: &str) -> Result<Self, BoxError> {
        let name = format!("todo_list_test_{}", Uuid::new_v4().simple());
        let mut admin = PgConnection::establish(admin_url)?;
        admin.batch_execute(&format!("CREATE DATABASE \"{name}\""))?;

        let base = admin_url
            .rsplit_once('/')
            .map_or(admin_url, |(prefix, _)| prefix);
        let database = Self {
            admin_url: admin_url.to_owned(),
            url: format!("{base}/{name}"),
            name,
        };

        let mut conn = PgConnection::establish(&database.url)?;
        conn.batch_execute(CREATE_TASKS_SQL)?;
        Ok(database)
    }

    /// Connection URL of the temporary database.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for TemporaryDatabase {
    fn drop(&mut self) {
        if let Ok(mut admin) = PgConnection::establish(&self.admin_url) {
            let drop_sql = format!("DROP DATABASE IF EXISTS \"{}\" WITH (FORCE)", self.name);
            if let Err(err) = admin.batch_execute(&drop_sql) {
                tracing::warn!(database = %self.name, error = %err, "failed to drop test database");
            }
        }
    }
}

/// Repository bound to a temporary database.
pub struct TaskTestContext {
    pub repository: PostgresTaskRepository,
    database: TemporaryDatabase,
}

impl TaskTestContext {
    /// Connection URL of the database behind `repository`.
    pub fn database_url(&self) -> &str {
        self.database.url()
    }
}

/// Builds a context on a fresh database.
///
/// # Errors
///
/// Fails when `TODO_LIST_TEST_DATABASE_URL` is unset, so running the ignored
/// suite without a server reports failures instead of passing.
/// Also fails if database setup or pool construction fails.
pub fn task_context() -> Result<TaskTestContext, BoxError> {
    let admin_url = std::env::var(TEST_DATABASE_URL_ENV).map_err(|_| {
        format!("{TEST_DATABASE_URL_ENV} must name a PostgreSQL server that allows CREATE DATABASE")
    })?;
    let database = TemporaryDatabase::create(&admin_url)?;
    let pool: TaskPgPool = Pool::builder()
        .max_size(2)
        .build(ConnectionManager::<PgConnection>::new(database.url()))?;
    Ok(TaskTestContext {
        repository: PostgresTaskRepository::new(pool),
        database,
    })
}
