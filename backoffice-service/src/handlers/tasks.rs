//! Task endpoints.

use crate::context::UserContext;
use crate::models::{CreateTask, ListTasksFilter, UpdateTask};
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use backoffice_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

pub async fn create(
    State(state): State<AppState>,
    ctx: UserContext,
    Json(input): Json<CreateTask>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_editor()?;
    input.validate()?;

    let task = state.db.create_task(&input, &ctx).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn get(
    State(state): State<AppState>,
    _ctx: UserContext,
    Path(task_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let task = state
        .db
        .get_task(task_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Task not found")))?;
    Ok(Json(task))
}

pub async fn list(
    State(state): State<AppState>,
    _ctx: UserContext,
    Query(filter): Query<ListTasksFilter>,
) -> Result<impl IntoResponse, AppError> {
    let tasks = state.db.list_tasks(&filter).await?;
    Ok(Json(tasks))
}

pub async fn update(
    State(state): State<AppState>,
    ctx: UserContext,
    Path(task_id): Path<Uuid>,
    Json(input): Json<UpdateTask>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_editor()?;
    input.validate()?;

    let task = state
        .db
        .update_task(task_id, &input, &ctx)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Task not found")))?;
    Ok(Json(task))
}

pub async fn remove(
    State(state): State<AppState>,
    ctx: UserContext,
    Path(task_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_admin()?;

    if !state.db.delete_task(task_id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("Task not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}
