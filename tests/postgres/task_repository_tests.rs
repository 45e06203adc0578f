//! `PostgreSQL` adapter tests mirroring the in-memory repository contract.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use mockable::DefaultClock;
use rstest::rstest;
use todo_list::task::{
    domain::{NewTask, TaskDate, TaskStatus, TaskTitle, TaskUpdate},
    ports::{TaskRepository, TaskRepositoryError},
    services::{TaskErrorKind, TaskLifecycleService},
};
use todo_list::telemetry::Logger;

use crate::postgres::helpers::{BoxError, TaskTestContext, task_context};

const UNKNOWN_ID: &str = "5f0c1c2e-8f4a-4a55-9c55-2a0f5d7e0b11";

fn new_task(title: &str, day: &str) -> Result<NewTask, BoxError> {
    Ok(NewTask::new(TaskTitle::new(title)?, TaskDate::parse(day)?))
}

fn as_of(day: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, day, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

#[rstest]
#[ignore = "requires a PostgreSQL server in TODO_LIST_TEST_DATABASE_URL"]
#[tokio::test(flavor = "multi_thread")]
async fn created_task_round_trips_through_list() -> Result<(), BoxError> {
    let TaskTestContext { repository, .. } = &task_context()?;

    let id = repository.create(&new_task("Pay rent", "2024-04-15")?).await?;
    let listed = repository.list(TaskStatus::Active, as_of(20)).await?;

    assert_eq!(listed.len(), 1);
    let task = listed.first().ok_or("missing listed task")?;
    assert_eq!(task.id(), id);
    assert_eq!(task.title(), "Pay rent");
    assert_eq!(task.active_at(), TaskDate::parse("2024-04-15")?);
    assert_eq!(task.status(), TaskStatus::Active);
    Ok(())
}

#[rstest]
#[ignore = "requires a PostgreSQL server in TODO_LIST_TEST_DATABASE_URL"]
#[tokio::test(flavor = "multi_thread")]
async fn active_list_is_ordered_and_bounded_by_as_of() -> Result<(), BoxError> {
    let TaskTestContext { repository, .. } = &task_context()?;

    repository.create(&new_task("Later", "2024-04-18")?).await?;
    repository.create(&new_task("Earlier", "2024-04-10")?).await?;
    repository.create(&new_task("Future", "2024-05-01")?).await?;

    let listed = repository.list(TaskStatus::Active, as_of(20)).await?;
    let titles: Vec<&str> = listed.iter().map(|task| task.title()).collect();

    assert_eq!(titles, ["Earlier", "Later"]);
    Ok(())
}

#[rstest]
#[ignore = "requires a PostgreSQL server in TODO_LIST_TEST_DATABASE_URL"]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_active_task_is_rejected() -> Result<(), BoxError> {
    let TaskTestContext { repository, .. } = &task_context()?;
    let task = new_task("Pay rent", "2024-04-15")?;

    repository.create(&task).await?;
    let duplicate = repository.create(&task).await;

    assert!(matches!(
        duplicate,
        Err(TaskRepositoryError::AlreadyExists { .. })
    ));
    Ok(())
}

#[rstest]
#[ignore = "requires a PostgreSQL server in TODO_LIST_TEST_DATABASE_URL"]
#[tokio::test(flavor = "multi_thread")]
async fn done_task_frees_title_and_date() -> Result<(), BoxError> {
    let TaskTestContext { repository, .. } = &task_context()?;
    let task = new_task("Pay rent", "2024-04-15")?;

    let first = repository.create(&task).await?;
    repository.mark_done(&first.to_string()).await?;
    repository.mark_done(&first.to_string()).await?;
    let second = repository.create(&task).await?;

    let done = repository.list(TaskStatus::Done, as_of(1)).await?;
    let active = repository.list(TaskStatus::Active, as_of(20)).await?;
    assert_eq!(done.iter().map(|t| t.id()).collect::<Vec<_>>(), [first]);
    assert_eq!(active.iter().map(|t| t.id()).collect::<Vec<_>>(), [second]);
    Ok(())
}

#[rstest]
#[ignore = "requires a PostgreSQL server in TODO_LIST_TEST_DATABASE_URL"]
#[tokio::test(flavor = "multi_thread")]
async fn update_rejects_collision_but_accepts_own_values() -> Result<(), BoxError> {
    let TaskTestContext { repository, .. } = &task_context()?;
    repository.create(&new_task("Pay rent", "2024-04-15")?).await?;
    let id = repository
        .create(&new_task("Call plumber", "2024-04-15")?)
        .await?;

    let collision = repository
        .update(&TaskUpdate::new(
            id.to_string(),
            TaskTitle::new("Pay rent")?,
            TaskDate::parse("2024-04-15")?,
        ))
        .await;
    repository
        .update(&TaskUpdate::new(
            id.to_string(),
            TaskTitle::new("Call plumber")?,
            TaskDate::parse("2024-04-15")?,
        ))
        .await?;

    assert!(matches!(
        collision,
        Err(TaskRepositoryError::AlreadyExists { .. })
    ));
    Ok(())
}

#[rstest]
#[ignore = "requires a PostgreSQL server in TODO_LIST_TEST_DATABASE_URL"]
#[tokio::test(flavor = "multi_thread")]
async fn missing_and_malformed_ids_are_distinguished() -> Result<(), BoxError> {
    let TaskTestContext { repository, .. } = &task_context()?;

    let not_found = repository.delete(UNKNOWN_ID).await;
    let invalid = repository.mark_done("not-a-uuid").await;
    let update_missing = repository
        .update(&TaskUpdate::new(
            UNKNOWN_ID,
            TaskTitle::new("Pay rent")?,
            TaskDate::parse("2024-04-15")?,
        ))
        .await;

    assert!(matches!(not_found, Err(TaskRepositoryError::NotFound(_))));
    assert!(matches!(invalid, Err(TaskRepositoryError::InvalidId(_))));
    assert!(matches!(
        update_missing,
        Err(TaskRepositoryError::NotFound(_))
    ));
    Ok(())
}

#[rstest]
#[ignore = "requires a PostgreSQL server in TODO_LIST_TEST_DATABASE_URL"]
#[tokio::test(flavor = "multi_thread")]
async fn delete_removes_the_record() -> Result<(), BoxError> {
    let TaskTestContext { repository, .. } = &task_context()?;
    let id = repository.create(&new_task("Pay rent", "2024-04-15")?).await?;

    repository.delete(&id.to_string()).await?;
    let again = repository.delete(&id.to_string()).await;

    assert!(matches!(again, Err(TaskRepositoryError::NotFound(_))));
    assert!(repository.list(TaskStatus::Active, as_of(20)).await?.is_empty());
    Ok(())
}

#[rstest]
#[ignore = "requires a PostgreSQL server in TODO_LIST_TEST_DATABASE_URL"]
#[tokio::test(flavor = "multi_thread")]
async fn service_over_postgres_reports_duplicate_kind() -> Result<(), BoxError> {
    let context = task_context()?;
    let service = TaskLifecycleService::new(
        Arc::new(context.repository),
        Arc::new(DefaultClock),
        Logger::disabled(),
    );

    service
        .create("Pay rent", TaskDate::parse("2024-04-13")?)
        .await?;
    let duplicate = service
        .create("Pay rent", TaskDate::parse("2024-04-13")?)
        .await;

    assert_eq!(
        duplicate.map_err(|err| err.kind()).err(),
        Some(TaskErrorKind::AlreadyExists)
    );
    Ok(())
}

#[rstest]
#[ignore = "requires a PostgreSQL server in TODO_LIST_TEST_DATABASE_URL"]
#[tokio::test(flavor = "multi_thread")]
async fn write_that_outlives_its_deadline_is_rolled_back() -> Result<(), BoxError> {
    let context = task_context()?;
    let bounded = context
        .repository
        .clone()
        .with_deadline(Duration::from_millis(300));
    let service = TaskLifecycleService::new(
        Arc::new(bounded),
        Arc::new(DefaultClock),
        Logger::disabled(),
    )
    .with_timeout(Duration::from_secs(5));

    let mut blocker = PgConnection::establish(context.database_url())?;
    blocker.batch_execute("BEGIN; LOCK TABLE tasks IN ACCESS EXCLUSIVE MODE;")?;
    let blocked = service
        .create("Pay rent", TaskDate::parse("2024-04-15")?)
        .await;
    blocker.batch_execute("COMMIT")?;

    assert_eq!(
        blocked.map_err(|err| err.kind()).err(),
        Some(TaskErrorKind::DeadlineExceeded)
    );
    let repository = &context.repository;
    assert!(repository.list(TaskStatus::Active, as_of(20)).await?.is_empty());

    service
        .create("Pay rent", TaskDate::parse("2024-04-15")?)
        .await?;
    assert_eq!(repository.list(TaskStatus::Active, as_of(20)).await?.len(), 1);
    Ok(())
}
