//! Route handlers. Each one decodes the request, calls the lifecycle service
//! and maps its outcome to a status code.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use mockable::Clock;
use serde::{Deserialize, Serialize};

use super::error::ApiErrorResponse;
use crate::task::{
    domain::{Task, TaskDate, TaskId},
    ports::TaskRepository,
    services::{TaskLifecycleService, UpdateTaskRequest},
};

/// Query string of `GET /tasks`.
#[derive(Debug, Deserialize)]
pub(super) struct ListQuery {
    #[serde(default)]
    status: String,
}

/// Body of `POST /tasks` and `PUT /tasks/{id}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct TaskPayload {
    title: String,
    active_at: TaskDate,
}

/// Body of a successful `POST /tasks`.
#[derive(Debug, Serialize)]
pub(super) struct CreatedTask {
    id: TaskId,
}

pub(super) async fn list_tasks<R, C>(
    State(service): State<TaskLifecycleService<R, C>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Task>>, ApiErrorResponse>
where
    R: TaskRepository + ?Sized + 'static,
    C: Clock + Send + Sync + 'static,
{
    service
        .list(&query.status)
        .await
        .map(Json)
        .map_err(|err| ApiErrorResponse::from_lifecycle(&err, StatusCode::BAD_REQUEST))
}

pub(super) async fn create_task<R, C>(
    State(service): State<TaskLifecycleService<R, C>>,
    payload: Result<Json<TaskPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedTask>), ApiErrorResponse>
where
    R: TaskRepository + ?Sized + 'static,
    C: Clock + Send + Sync + 'static,
{
    let Json(TaskPayload { title, active_at }) = payload?;
    let id = service
        .create(title, active_at)
        .await
        .map_err(|err| ApiErrorResponse::from_lifecycle(&err, StatusCode::NOT_FOUND))?;
    Ok((StatusCode::CREATED, Json(CreatedTask { id })))
}

pub(super) async fn update_task<R, C>(
    State(service): State<TaskLifecycleService<R, C>>,
    Path(id): Path<String>,
    payload: Result<Json<TaskPayload>, JsonRejection>,
) -> Result<StatusCode, ApiErrorResponse>
where
    R: TaskRepository + ?Sized + 'static,
    C: Clock + Send + Sync + 'static,
{
    let Json(TaskPayload { title, active_at }) = payload?;
    service
        .update_task(UpdateTaskRequest::new(id, title, active_at))
        .await
        .map_err(|err| ApiErrorResponse::from_lifecycle(&err, StatusCode::BAD_REQUEST))?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn mark_task_done<R, C>(
    State(service): State<TaskLifecycleService<R, C>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiErrorResponse>
where
    R: TaskRepository + ?Sized + 'static,
    C: Clock + Send + Sync + 'static,
{
    service
        .mark_task_done(&id)
        .await
        .map_err(|err| ApiErrorResponse::from_lifecycle(&err, StatusCode::NOT_FOUND))?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn delete_task<R, C>(
    State(service): State<TaskLifecycleService<R, C>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiErrorResponse>
where
    R: TaskRepository + ?Sized + 'static,
    C: Clock + Send + Sync + 'static,
{
    service
        .delete(&id)
        .await
        .map_err(|err| ApiErrorResponse::from_lifecycle(&err, StatusCode::BAD_REQUEST))?;
    Ok(StatusCode::NO_CONTENT)
}
