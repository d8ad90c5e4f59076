//! Resource (asset) endpoints.

use crate::context::UserContext;
use crate::models::{CreateResource, ListResourcesFilter, UpdateResource};
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
    Json(input): Json<CreateResource>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_editor()?;
    input.validate()?;

    let resource = state.db.create_resource(&input, &ctx).await?;
    Ok((StatusCode::CREATED, Json(resource)))
}

pub async fn get(
    State(state): State<AppState>,
    _ctx: UserContext,
    Path(resource_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state
        .db
        .get_resource(resource_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Resource not found")))?;
    Ok(Json(resource))
}

pub async fn list(
    State(state): State<AppState>,
    _ctx: UserContext,
    Query(filter): Query<ListResourcesFilter>,
) -> Result<impl IntoResponse, AppError> {
    let resources = state.db.list_resources(&filter).await?;
    Ok(Json(resources))
}

pub async fn update(
    State(state): State<AppState>,
    ctx: UserContext,
    Path(resource_id): Path<Uuid>,
    Json(input): Json<UpdateResource>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_editor()?;
    input.validate()?;

    let resource = state
        .db
        .update_resource(resource_id, &input, &ctx)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Resource not found")))?;
    Ok(Json(resource))
}

pub async fn remove(
    State(state): State<AppState>,
    ctx: UserContext,
    Path(resource_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_admin()?;

    if !state.db.delete_resource(resource_id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("Resource not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}
