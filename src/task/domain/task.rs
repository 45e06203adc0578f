//! Task entity and related lifecycle types.

use super::{ParseTaskStatusError, TaskDate, TaskId, TaskTitle};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task lifecycle status.
///
/// The only transition is `Active` to `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is pending and shows up in the active listing once due.
    Active,
    /// Task has been completed.
    Done,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Done => "done",
        }
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "active" => Ok(Self::Active),
            "done" => Ok(Self::Done),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task that has not been stored yet.
///
/// Storage assigns the identifier on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    title: TaskTitle,
    active_at: TaskDate,
    status: TaskStatus,
}

impl NewTask {
    /// Creates a task in the [`TaskStatus::Active`] state.
    #[must_use]
    pub const fn new(title: TaskTitle, active_at: TaskDate) -> Self {
        Self {
            title,
            active_at,
            status: TaskStatus::Active,
        }
    }

    /// Returns the task title.
    #[must_use]
    pub const fn title(&self) -> &TaskTitle {
        &self.title
    }

    /// Returns the activation date.
    #[must_use]
    pub const fn active_at(&self) -> TaskDate {
        self.active_at
    }

    /// Returns the initial status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }
}

/// Replacement title and activation date for an existing task.
///
/// The identifier is kept in its textual form; decoding it into a storage
/// reference is the repository's job so that malformed identifiers surface
/// as an invalid-id failure from the adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskUpdate {
    id: String,
    fields: NewTask,
}

impl TaskUpdate {
    /// Creates an update targeting the task with the given identifier.
    #[must_use]
    pub fn new(id: impl Into<String>, title: TaskTitle, active_at: TaskDate) -> Self {
        Self {
            id: id.into(),
            fields: NewTask::new(title, active_at),
        }
    }

    /// Returns the raw identifier of the targeted task.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the replacement title.
    #[must_use]
    pub const fn title(&self) -> &TaskTitle {
        self.fields.title()
    }

    /// Returns the replacement activation date.
    #[must_use]
    pub const fn active_at(&self) -> TaskDate {
        self.fields.active_at()
    }

    /// Returns the status used for duplicate detection.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.fields.status()
    }
}

/// Stored task as returned by the repository.
///
/// Serializes to the wire shape `{ id, title, activeAt }`; the status is not
/// serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    id: TaskId,
    title: String,
    active_at: TaskDate,
    #[serde(skip)]
    status: TaskStatus,
}

/// Parameter object for reconstructing a persisted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted title.
    pub title: String,
    /// Persisted activation date.
    pub active_at: TaskDate,
    /// Persisted lifecycle status.
    pub status: TaskStatus,
}

impl Task {
    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            active_at: data.active_at,
            status: data.status,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the task title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the activation date.
    #[must_use]
    pub const fn active_at(&self) -> TaskDate {
        self.active_at
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns a copy of the task with `prefix` prepended to its title.
    #[must_use]
    pub fn with_title_prefix(mut self, prefix: &str) -> Self {
        self.title.insert_str(0, prefix);
        self
    }
}
