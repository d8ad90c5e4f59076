//! Site endpoints.

use crate::context::UserContext;
use crate::models::{CreateSite, ListSitesFilter, UpdateSite};
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
    Json(input): Json<CreateSite>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_editor()?;
    input.validate()?;

    let site = state.db.create_site(&input, &ctx).await?;
    Ok((StatusCode::CREATED, Json(site)))
}

pub async fn get(
    State(state): State<AppState>,
    _ctx: UserContext,
    Path(site_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let site = state
        .db
        .get_site(site_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Site not found")))?;
    Ok(Json(site))
}

pub async fn list(
    State(state): State<AppState>,
    _ctx: UserContext,
    Query(filter): Query<ListSitesFilter>,
) -> Result<impl IntoResponse, AppError> {
    let sites = state.db.list_sites(&filter).await?;
    Ok(Json(sites))
}

pub async fn update(
    State(state): State<AppState>,
    ctx: UserContext,
    Path(site_id): Path<Uuid>,
    Json(input): Json<UpdateSite>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_editor()?;
    input.validate()?;

    let site = state
        .db
        .update_site(site_id, &input, &ctx)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Site not found")))?;
    Ok(Json(site))
}

pub async fn deactivate(
    State(state): State<AppState>,
    ctx: UserContext,
    Path(site_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_admin()?;

    let site = state
        .db
        .deactivate_site(site_id, &ctx)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Site not found")))?;
    Ok(Json(site))
}
