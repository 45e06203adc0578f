//! Diesel row models for task persistence.

use super::schema::tasks;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Task title.
    pub title: String,
    /// Activation timestamp.
    pub active_at: DateTime<Utc>,
    /// Lifecycle status.
    pub status: String,
}

/// Insert model for task records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTaskRow {
    /// Task identifier assigned on insert.
    pub id: uuid::Uuid,
    /// Task title.
    pub title: String,
    /// Activation timestamp.
    pub active_at: DateTime<Utc>,
    /// Lifecycle status.
    pub status: String,
}
