//! Domain model for the task lifecycle.
//!
//! The task domain models identity, titles, activation dates and the
//! one-way `active` to `done` status transition, keeping all infrastructure
//! concerns outside of the domain boundary.

mod date;
mod error;
mod ids;
mod task;
mod title;

pub use date::TaskDate;
pub use error::{ParseTaskStatusError, TaskDomainError};
pub use ids::TaskId;
pub use task::{NewTask, PersistedTaskData, Task, TaskStatus, TaskUpdate};
pub use title::{MAX_TITLE_CHARS, TaskTitle};
