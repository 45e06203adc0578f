//! Repository port for task persistence and status-filtered listing.

use crate::task::domain::{NewTask, Task, TaskDate, TaskId, TaskStatus, TaskUpdate};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Task persistence contract.
///
/// Identifiers arrive in their textual form; each adapter decodes them into
/// its native storage reference and reports [`TaskRepositoryError::InvalidId`]
/// when that fails.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task and returns the identifier assigned to it.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::AlreadyExists`] when a task with the
    /// same title, activation date and status is already stored.
    async fn create(&self, task: &NewTask) -> TaskRepositoryResult<TaskId>;

    /// Lists tasks with the given status, ordered by activation date.
    ///
    /// For [`TaskStatus::Active`] only tasks with an activation date at or
    /// before `as_of` are returned. Done tasks are returned regardless of
    /// their date.
    async fn list(
        &self,
        status: TaskStatus,
        as_of: DateTime<Utc>,
    ) -> TaskRepositoryResult<Vec<Task>>;

    /// Replaces the title and activation date of an existing task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::InvalidId`] for a malformed identifier,
    /// [`TaskRepositoryError::AlreadyExists`] when another task already holds
    /// the new title and date, and [`TaskRepositoryError::NotFound`] when no
    /// task has the identifier.
    async fn update(&self, update: &TaskUpdate) -> TaskRepositoryResult<()>;

    /// Marks a task as done. Marking a done task again succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::InvalidId`] or
    /// [`TaskRepositoryError::NotFound`].
    async fn mark_done(&self, id: &str) -> TaskRepositoryResult<()>;

    /// Removes a task permanently.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::InvalidId`] or
    /// [`TaskRepositoryError::NotFound`].
    async fn delete(&self, id: &str) -> TaskRepositoryResult<()>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// The identifier does not decode to a storage reference.
    #[error("invalid task identifier: {0}")]
    InvalidId(String),

    /// A task with the same title, date and status already exists.
    #[error("task already exists: '{title}' on {active_at}")]
    AlreadyExists {
        /// Title of the rejected task.
        title: String,
        /// Activation date of the rejected task.
        active_at: TaskDate,
    },

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The store gave up on the call once its deadline passed. Nothing the
    /// call wrote is kept.
    #[error("storage deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Builds the duplicate error for the given title and date.
    pub fn already_exists(title: impl Into<String>, active_at: TaskDate) -> Self {
        Self::AlreadyExists {
            title: title.into(),
            active_at,
        }
    }
}
