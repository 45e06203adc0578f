//! Service layer for task creation, listing and lifecycle changes.

use crate::task::{
    domain::{
        NewTask, ParseTaskStatusError, Task, TaskDate, TaskDomainError, TaskId, TaskStatus,
        TaskTitle, TaskUpdate,
    },
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};
use crate::telemetry::Logger;
use mockable::Clock;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Prefix added to the titles of listed tasks that fall on a weekend.
pub const WEEKEND_MARKER: &str = "ВЫХОДНОЙ - ";

/// Request payload for replacing the title and date of a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTaskRequest {
    id: String,
    title: String,
    active_at: TaskDate,
}

impl UpdateTaskRequest {
    /// Creates a request targeting the task with the given identifier.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>, active_at: TaskDate) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            active_at,
        }
    }
}

/// Failure categories callers branch on, independent of message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskErrorKind {
    /// Title is empty or longer than the limit.
    InvalidTitle,
    /// Activation date is malformed.
    InvalidDate,
    /// Status filter is not recognized.
    InvalidStatus,
    /// Identifier does not decode to a storage reference.
    InvalidId,
    /// A task with the same title, date and status exists.
    AlreadyExists,
    /// No task has the identifier.
    NotFound,
    /// The storage call did not finish before the deadline.
    DeadlineExceeded,
    /// Infrastructure failure.
    Storage,
}

/// Service-level errors for task lifecycle operations.
#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// The status filter is not `active`, `done` or empty.
    #[error("invalid status filter: {0}")]
    InvalidStatus(#[from] ParseTaskStatusError),

    /// Repository operation failed.
    #[error("failed to {operation}: {source}")]
    Repository {
        /// Operation that was being performed.
        operation: &'static str,
        /// Underlying repository error.
        #[source]
        source: TaskRepositoryError,
    },

    /// The repository call was abandoned after the configured deadline.
    #[error("failed to {operation}: deadline of {timeout:?} exceeded")]
    DeadlineExceeded {
        /// Operation that was being performed.
        operation: &'static str,
        /// Deadline that elapsed.
        timeout: Duration,
    },
}

impl TaskLifecycleError {
    /// Returns the failure category.
    #[must_use]
    pub const fn kind(&self) -> TaskErrorKind {
        match self {
            Self::Domain(TaskDomainError::EmptyTitle | TaskDomainError::TitleTooLong { .. }) => {
                TaskErrorKind::InvalidTitle
            }
            Self::Domain(TaskDomainError::InvalidDate(_)) => TaskErrorKind::InvalidDate,
            Self::Domain(TaskDomainError::InvalidId(_))
            | Self::Repository {
                source: TaskRepositoryError::InvalidId(_),
                ..
            } => TaskErrorKind::InvalidId,
            Self::InvalidStatus(_) => TaskErrorKind::InvalidStatus,
            Self::Repository {
                source: TaskRepositoryError::AlreadyExists { .. },
                ..
            } => TaskErrorKind::AlreadyExists,
            Self::Repository {
                source: TaskRepositoryError::NotFound(_),
                ..
            } => TaskErrorKind::NotFound,
            Self::Repository {
                source: TaskRepositoryError::Persistence(_),
                ..
            } => TaskErrorKind::Storage,
            Self::Repository {
                source: TaskRepositoryError::DeadlineExceeded(_),
                ..
            }
            | Self::DeadlineExceeded { .. } => TaskErrorKind::DeadlineExceeded,
        }
    }
}

/// Result type for task lifecycle service operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;

/// Task lifecycle orchestration service.
///
/// Validates input, applies listing defaults and the weekend annotation,
/// and delegates persistence to a [`TaskRepository`].
pub struct TaskLifecycleService<R, C>
where
    R: TaskRepository + ?Sized,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    logger: Logger,
    timeout: Option<Duration>,
}

impl<R, C> Clone for TaskLifecycleService<R, C>
where
    R: TaskRepository + ?Sized,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            clock: Arc::clone(&self.clock),
            logger: self.logger.clone(),
            timeout: self.timeout,
        }
    }
}

impl<R, C> TaskLifecycleService<R, C>
where
    R: TaskRepository + ?Sized,
    C: Clock + Send + Sync,
{
    /// Creates a new task lifecycle service without a storage deadline.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>, logger: Logger) -> Self {
        Self {
            repository,
            clock,
            logger,
            timeout: None,
        }
    }

    /// Bounds every repository call by `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Creates an active task and returns its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskErrorKind::InvalidTitle`] before touching storage when
    /// the title is blank or too long, and [`TaskErrorKind::AlreadyExists`]
    /// when the title and date are taken.
    pub async fn create(
        &self,
        title: impl Into<String>,
        active_at: TaskDate,
    ) -> TaskLifecycleResult<TaskId> {
        let validated = self.validate_title(title)?;
        let task = NewTask::new(validated, active_at);
        let id = self
            .bounded("create task", self.repository.create(&task))
            .await?;
        self.logger
            .in_scope(|| tracing::debug!(task_id = %id, %active_at, "task created"));
        Ok(id)
    }

    /// Lists tasks by status, annotating weekend tasks.
    ///
    /// An empty `status` lists active tasks. Active tasks dated after the
    /// current clock time are left out.
    ///
    /// # Errors
    ///
    /// Returns [`TaskErrorKind::InvalidStatus`] for any status other than
    /// `active`, `done` or the empty string.
    pub async fn list(&self, status: &str) -> TaskLifecycleResult<Vec<Task>> {
        let filter = if status.is_empty() {
            TaskStatus::Active
        } else {
            TaskStatus::try_from(status)?
        };

        let tasks = self
            .bounded("list tasks", self.repository.list(filter, self.clock.utc()))
            .await?;
        Ok(tasks.into_iter().map(annotate_weekend).collect())
    }

    /// Replaces the title and activation date of a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskErrorKind::InvalidTitle`] before touching storage, or
    /// the repository outcome: [`TaskErrorKind::InvalidId`],
    /// [`TaskErrorKind::AlreadyExists`] or [`TaskErrorKind::NotFound`].
    pub async fn update_task(&self, request: UpdateTaskRequest) -> TaskLifecycleResult<()> {
        let UpdateTaskRequest {
            id,
            title,
            active_at,
        } = request;
        let update = TaskUpdate::new(id, self.validate_title(title)?, active_at);
        self.bounded("update task", self.repository.update(&update))
            .await
    }

    /// Marks a task as done. Repeating the call succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`TaskErrorKind::InvalidId`] or [`TaskErrorKind::NotFound`].
    pub async fn mark_task_done(&self, id: &str) -> TaskLifecycleResult<()> {
        self.bounded("mark task done", self.repository.mark_done(id))
            .await
    }

    /// Deletes a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskErrorKind::InvalidId`] or [`TaskErrorKind::NotFound`].
    pub async fn delete(&self, id: &str) -> TaskLifecycleResult<()> {
        self.bounded("delete task", self.repository.delete(id)).await
    }

    fn validate_title(&self, title: impl Into<String>) -> TaskLifecycleResult<TaskTitle> {
        TaskTitle::new(title).map_err(|err| {
            self.logger
                .in_scope(|| tracing::debug!(error = %err, "task title rejected"));
            TaskLifecycleError::from(err)
        })
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = TaskRepositoryResult<T>>,
    ) -> TaskLifecycleResult<T> {
        let outcome = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, call)
                .await
                .map_err(|_| TaskLifecycleError::DeadlineExceeded { operation, timeout })?,
            None => call.await,
        };
        outcome.map_err(|source| TaskLifecycleError::Repository { operation, source })
    }
}

fn annotate_weekend(task: Task) -> Task {
    if task.active_at().is_weekend() {
        task.with_title_prefix(WEEKEND_MARKER)
    } else {
        task
    }
}
