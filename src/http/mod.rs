//! HTTP surface over the task lifecycle service.
//!
//! Task routes are nested under [`BASE_PATH`]; `GET /health` sits at the
//! root. Every request runs with the supplied [`Logger`] as its dispatcher,
//! so handler events and the `tower-http` trace spans reach it.

mod error;
mod handlers;

pub use error::{ApiError, ApiErrorResponse};

use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, put},
};
use mockable::Clock;
use tower_http::trace::TraceLayer;
use tracing::instrument::WithSubscriber;

use crate::task::{ports::TaskRepository, services::TaskLifecycleService};
use crate::telemetry::Logger;

/// Prefix of every task route.
pub const BASE_PATH: &str = "/api/v1/todo-list";

/// Builds the application router.
#[must_use]
pub fn router<R, C>(service: TaskLifecycleService<R, C>, logger: Logger) -> Router
where
    R: TaskRepository + ?Sized + 'static,
    C: Clock + Send + Sync + 'static,
{
    let tasks = Router::new()
        .route(
            "/tasks",
            get(handlers::list_tasks::<R, C>).post(handlers::create_task::<R, C>),
        )
        .route(
            "/tasks/{id}",
            put(handlers::update_task::<R, C>).delete(handlers::delete_task::<R, C>),
        )
        .route("/tasks/{id}/done", put(handlers::mark_task_done::<R, C>));

    Router::new()
        .nest(BASE_PATH, tasks)
        .route("/health", get(|| async { "ok" }))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn_with_state(logger, scoped_logger))
        .with_state(service)
}

async fn scoped_logger(State(logger): State<Logger>, request: Request, next: Next) -> Response {
    next.run(request)
        .with_subscriber(logger.dispatch().clone())
        .await
}
