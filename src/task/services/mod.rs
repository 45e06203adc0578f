//! Application services for task lifecycle orchestration.

mod lifecycle;

pub use lifecycle::{
    TaskErrorKind, TaskLifecycleError, TaskLifecycleResult, TaskLifecycleService,
    UpdateTaskRequest, WEEKEND_MARKER,
};
