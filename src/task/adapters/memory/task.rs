//! In-memory repository for task lifecycle tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::task::{
    domain::{NewTask, PersistedTaskData, Task, TaskDate, TaskId, TaskStatus, TaskUpdate},
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};

/// Thread-safe in-memory task repository.
///
/// Records are kept in insertion order, so listing ties on the activation
/// date resolve to creation order. The duplicate check and the write happen
/// under a single write lock.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<Vec<StoredTask>>>,
}

/// Stored record, mirroring the persisted `{ id, title, active_at, status }`
/// shape.
#[derive(Debug, Clone)]
struct StoredTask {
    id: Uuid,
    title: String,
    active_at: DateTime<Utc>,
    status: TaskStatus,
}

impl StoredTask {
    fn to_task(&self) -> Task {
        Task::from_persisted(PersistedTaskData {
            id: TaskId::from_uuid(self.id),
            title: self.title.clone(),
            active_at: TaskDate::from_timestamp(self.active_at),
            status: self.status,
        })
    }
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl ToString) -> TaskRepositoryError {
    TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

fn decode_id(id: &str) -> TaskRepositoryResult<Uuid> {
    TaskId::parse(id)
        .map(TaskId::into_inner)
        .map_err(|_| TaskRepositoryError::InvalidId(id.to_owned()))
}

/// Returns whether a record other than `excluding` matches the duplicate key.
fn duplicate_exists(
    tasks: &[StoredTask],
    title: &str,
    active_at: DateTime<Utc>,
    status: TaskStatus,
    excluding: Option<Uuid>,
) -> bool {
    tasks.iter().any(|stored| {
        Some(stored.id) != excluding
            && stored.title == title
            && stored.active_at == active_at
            && stored.status == status
    })
}

fn find_mut(tasks: &mut [StoredTask], id: Uuid) -> TaskRepositoryResult<&mut StoredTask> {
    tasks
        .iter_mut()
        .find(|stored| stored.id == id)
        .ok_or_else(|| TaskRepositoryError::NotFound(TaskId::from_uuid(id)))
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn create(&self, task: &NewTask) -> TaskRepositoryResult<TaskId> {
        let mut tasks = self.state.write().map_err(lock_error)?;
        let active_at = task.active_at().to_timestamp();
        if duplicate_exists(&tasks, task.title().as_str(), active_at, task.status(), None) {
            return Err(TaskRepositoryError::already_exists(
                task.title().as_str(),
                task.active_at(),
            ));
        }

        let id = TaskId::new();
        tasks.push(StoredTask {
            id: id.into_inner(),
            title: task.title().as_str().to_owned(),
            active_at,
            status: task.status(),
        });
        Ok(id)
    }

    async fn list(
        &self,
        status: TaskStatus,
        as_of: DateTime<Utc>,
    ) -> TaskRepositoryResult<Vec<Task>> {
        let tasks = self.state.read().map_err(lock_error)?;
        let mut matching: Vec<&StoredTask> = tasks
            .iter()
            .filter(|stored| stored.status == status)
            .filter(|stored| status != TaskStatus::Active || stored.active_at <= as_of)
            .collect();
        matching.sort_by_key(|stored| stored.active_at);
        Ok(matching.into_iter().map(StoredTask::to_task).collect())
    }

    async fn update(&self, update: &TaskUpdate) -> TaskRepositoryResult<()> {
        let id = decode_id(update.id())?;
        let mut tasks = self.state.write().map_err(lock_error)?;
        let active_at = update.active_at().to_timestamp();
        if duplicate_exists(
            &tasks,
            update.title().as_str(),
            active_at,
            update.status(),
            Some(id),
        ) {
            return Err(TaskRepositoryError::already_exists(
                update.title().as_str(),
                update.active_at(),
            ));
        }

        let stored = find_mut(&mut tasks, id)?;
        stored.title = update.title().as_str().to_owned();
        stored.active_at = active_at;
        Ok(())
    }

    async fn mark_done(&self, id: &str) -> TaskRepositoryResult<()> {
        let uuid = decode_id(id)?;
        let mut tasks = self.state.write().map_err(lock_error)?;
        find_mut(&mut tasks, uuid)?.status = TaskStatus::Done;
        Ok(())
    }

    async fn delete(&self, id: &str) -> TaskRepositoryResult<()> {
        let uuid = decode_id(id)?;
        let mut tasks = self.state.write().map_err(lock_error)?;
        let before = tasks.len();
        tasks.retain(|stored| stored.id != uuid);
        if tasks.len() == before {
            return Err(TaskRepositoryError::NotFound(TaskId::from_uuid(uuid)));
        }
        Ok(())
    }
}
