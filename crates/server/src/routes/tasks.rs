use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::task::{CreateTask, Task, TaskFilter, TaskStatus, UpdateTask};
use services::services::transitions::StatusTransition;
use tracing::{info, instrument};
use utils::{pagination::Pagination, response::ApiResponse};
use uuid::Uuid;

use super::references::{StatusChange, require_event};
use crate::{AppState, auth::RequestContext, error::ApiError, middleware::load_task_middleware};

/// GET /api/v1/tasks - ordered by due date, then priority
#[instrument(
    name = "tasks.list",
    skip(state, ctx, filter, page),
    fields(user_id = %ctx.user_id, org_id = %ctx.organization_id)
)]
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(filter): Query<TaskFilter>,
    Query(page): Query<Pagination>,
) -> Result<ResponseJson<ApiResponse<Vec<Task>>>, ApiError> {
    let tasks = Task::find_all(state.pool(), ctx.organization_id, &filter, &page).await?;
    Ok(ResponseJson(ApiResponse::success(tasks)))
}

#[instrument(
    name = "tasks.create",
    skip(state, ctx, payload),
    fields(user_id = %ctx.user_id, org_id = %ctx.organization_id)
)]
pub async fn create_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<CreateTask>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    payload.validate()?;
    if let Some(event_id) = payload.event_id {
        require_event(state.pool(), ctx.organization_id, event_id).await?;
    }
    let task = Task::create(state.pool(), ctx.organization_id, &payload, Uuid::new_v4()).await?;
    info!(task_id = %task.id, "Created task");
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn get_task(
    Extension(task): Extension<Task>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(task)))
}

#[instrument(
    name = "tasks.update",
    skip(state, ctx, task, payload),
    fields(user_id = %ctx.user_id, org_id = %ctx.organization_id, task_id = %task.id)
)]
pub async fn update_task(
    Extension(task): Extension<Task>,
    Extension(ctx): Extension<RequestContext>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateTask>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    payload.validate()?;
    if let Some(event_id) = payload.event_id {
        require_event(state.pool(), task.organization_id, event_id).await?;
    }
    let updated = Task::update(state.pool(), task.organization_id, task.id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(updated)))
}

#[instrument(
    name = "tasks.delete",
    skip(state, ctx, task),
    fields(user_id = %ctx.user_id, org_id = %ctx.organization_id, task_id = %task.id)
)]
pub async fn delete_task(
    Extension(task): Extension<Task>,
    Extension(ctx): Extension<RequestContext>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = Task::delete(state.pool(), task.organization_id, task.id).await?;
    if rows_affected == 0 {
        return Err(ApiError::NotFound("task"));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

#[instrument(name = "tasks.set_status", skip(state, task), fields(task_id = %task.id))]
async fn move_task(
    state: &AppState,
    task: &Task,
    next: TaskStatus,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let next = task.status.transition_to(next)?;
    let updated = Task::update_status(state.pool(), task.organization_id, task.id, next).await?;
    info!(from = %task.status, to = %next, "Task status changed");
    Ok(ResponseJson(ApiResponse::success(updated)))
}

pub async fn set_task_status(
    Extension(task): Extension<Task>,
    State(state): State<AppState>,
    Json(payload): Json<StatusChange<TaskStatus>>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    move_task(&state, &task, payload.status).await
}

pub async fn complete_task(
    Extension(task): Extension<Task>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    move_task(&state, &task, TaskStatus::Done).await
}

pub fn router(state: &AppState) -> Router<AppState> {
    let task_router = Router::new()
        .route("/", get(get_task).put(update_task).delete(delete_task))
        .route("/status", post(set_task_status))
        .route("/complete", post(complete_task))
        .layer(from_fn_with_state(state.clone(), load_task_middleware));

    let inner = Router::new()
        .route("/", get(list_tasks).post(create_task))
        .nest("/{task_id}", task_router);

    Router::new().nest("/tasks", inner)
}
