//! Task handlers.
//!
//! Repository calls block on SQLite, so each one runs on the blocking pool.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use taskline_core::{NewTask, Task, TaskFilter, TaskId, TaskPatch};
use taskline_store::{TaskError, TaskRepository};
use tokio::task;

use crate::error::ApiError;
use crate::health::{self, HealthResponse};
use crate::server::AppState;

/// Query string for `GET /tasks`. Empty values count as absent.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// `true`/`false` (also `1`/`0`, `yes`/`no`, `on`/`off`).
    pub is_completed: Option<String>,
    /// Inclusive lower due-date bound.
    pub from_date: Option<String>,
    /// Inclusive upper due-date bound.
    pub to_date: Option<String>,
}

/// `GET /tasks` body.
#[derive(Debug, Serialize)]
pub struct TaskList {
    /// Matching tasks in id order.
    pub tasks: Vec<Task>,
}

/// `POST /tasks` body.
#[derive(Debug, Serialize)]
pub struct Created {
    /// Confirmation text.
    pub message: String,
    /// Id of the new task.
    pub id: TaskId,
}

/// `PATCH /tasks/{id}` body.
#[derive(Debug, Serialize)]
pub struct Updated {
    /// Confirmation text.
    pub message: String,
    /// The task after the update.
    pub task: Task,
}

/// `DELETE /tasks/{id}` body.
#[derive(Debug, Serialize)]
pub struct Deleted {
    /// Confirmation text.
    pub message: String,
}

/// Parse a boolean path or query literal.
pub fn parse_flag(raw: &str) -> Result<bool, ApiError> {
    match raw.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ApiError::BadRequest(format!("invalid is_completed value: {raw}"))),
    }
}

async fn blocking<T, F>(repo: &TaskRepository, op: F) -> Result<T, ApiError>
where
    F: FnOnce(&TaskRepository) -> Result<T, TaskError> + Send + 'static,
    T: Send + 'static,
{
    let repo = repo.clone();
    task::spawn_blocking(move || op(&repo))
        .await
        .map_err(|e| ApiError::Internal(format!("blocking task failed: {e}")))?
        .map_err(ApiError::from)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn task_id(path: Result<Path<TaskId>, PathRejection>) -> Result<TaskId, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

/// GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health::health_check(state.start_time))
}

/// GET /tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    query: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<TaskList>, ApiError> {
    let Query(params) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let filter = TaskFilter {
        is_completed: non_empty(params.is_completed)
            .as_deref()
            .map(parse_flag)
            .transpose()?,
        from_date: non_empty(params.from_date),
        to_date: non_empty(params.to_date),
    };
    let tasks = blocking(&state.repo, move |repo| repo.fetch(&filter)).await?;
    Ok(Json(TaskList { tasks }))
}

/// GET /tasks/status/{is_completed}
pub async fn list_by_status(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<TaskList>, ApiError> {
    let Path(raw) = path.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let filter = TaskFilter::by_status(parse_flag(&raw)?);
    let tasks = blocking(&state.repo, move |repo| repo.fetch(&filter)).await?;
    Ok(Json(TaskList { tasks }))
}

/// GET /tasks/{id}
pub async fn get_task(
    State(state): State<AppState>,
    path: Result<Path<TaskId>, PathRejection>,
) -> Result<Json<Task>, ApiError> {
    let id = task_id(path)?;
    let task = blocking(&state.repo, move |repo| repo.fetch_by_id(id)).await?;
    Ok(Json(task))
}

/// POST /tasks
pub async fn create_task(
    State(state): State<AppState>,
    body: Result<Json<NewTask>, JsonRejection>,
) -> Result<(StatusCode, Json<Created>), ApiError> {
    let Json(new) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let id = blocking(&state.repo, move |repo| repo.create(&new)).await?;
    Ok((
        StatusCode::CREATED,
        Json(Created {
            message: "Task added successfully".into(),
            id,
        }),
    ))
}

/// PATCH /tasks/{id}
pub async fn update_task(
    State(state): State<AppState>,
    path: Result<Path<TaskId>, PathRejection>,
    body: Result<Json<TaskPatch>, JsonRejection>,
) -> Result<Json<Updated>, ApiError> {
    let id = task_id(path)?;
    let Json(patch) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let task = blocking(&state.repo, move |repo| repo.update(id, &patch)).await?;
    Ok(Json(Updated {
        message: format!("Task {id} updated"),
        task,
    }))
}

/// DELETE /tasks/{id}
pub async fn delete_task(
    State(state): State<AppState>,
    path: Result<Path<TaskId>, PathRejection>,
) -> Result<Json<Deleted>, ApiError> {
    let id = task_id(path)?;
    blocking(&state.repo, move |repo| repo.delete(id)).await?;
    Ok(Json(Deleted {
        message: format!("Task {id} has been deleted"),
    }))
}
