//! Shared fixtures for task unit tests.

use crate::task::{
    domain::{NewTask, Task, TaskDate, TaskId, TaskStatus, TaskUpdate},
    ports::{TaskRepository, TaskRepositoryResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;
use mockall::mock;

/// Clock frozen at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Clock frozen at noon UTC on the given day.
    pub fn at_noon(year: i32, month: u32, day: u32) -> Self {
        Self(
            Utc.with_ymd_and_hms(year, month, day, 12, 0, 0)
                .single()
                .expect("valid fixed clock instant"),
        )
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Parses a `YYYY-MM-DD` literal used in a test.
pub fn date(value: &str) -> TaskDate {
    TaskDate::parse(value).expect("valid test date")
}

mock! {
    pub Repository {}

    #[async_trait]
    impl TaskRepository for Repository {
        async fn create(&self, task: &NewTask) -> TaskRepositoryResult<TaskId>;
        async fn list(
            &self,
            status: TaskStatus,
            as_of: DateTime<Utc>,
        ) -> TaskRepositoryResult<Vec<Task>>;
        async fn update(&self, update: &TaskUpdate) -> TaskRepositoryResult<()>;
        async fn mark_done(&self, id: &str) -> TaskRepositoryResult<()>;
        async fn delete(&self, id: &str) -> TaskRepositoryResult<()>;
    }
}

/// Repository whose calls never complete.
#[derive(Debug, Default)]
pub struct StalledRepository;

#[async_trait]
impl TaskRepository for StalledRepository {
    async fn create(&self, _task: &NewTask) -> TaskRepositoryResult<TaskId> {
        std::future::pending().await
    }

    async fn list(
        &self,
        _status: TaskStatus,
        _as_of: DateTime<Utc>,
    ) -> TaskRepositoryResult<Vec<Task>> {
        std::future::pending().await
    }

    async fn update(&self, _update: &TaskUpdate) -> TaskRepositoryResult<()> {
        std::future::pending().await
    }

    async fn mark_done(&self, _id: &str) -> TaskRepositoryResult<()> {
        std::future::pending().await
    }

    async fn delete(&self, _id: &str) -> TaskRepositoryResult<()> {
        std::future::pending().await
    }
}
