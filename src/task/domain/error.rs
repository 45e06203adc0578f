//! Error types for task domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing domain task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The task title exceeds the code point limit.
    #[error("task title has {length} characters, limit is {max}")]
    TitleTooLong {
        /// Number of Unicode code points in the rejected title.
        length: usize,
        /// Maximum permitted number of code points.
        max: usize,
    },

    /// The activation date is not a `YYYY-MM-DD` calendar date.
    #[error("invalid activation date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    /// The task identifier does not decode to a storage reference.
    #[error("invalid task identifier '{0}'")]
    InvalidId(String),
}

/// Error returned while parsing task statuses from requests or persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);
