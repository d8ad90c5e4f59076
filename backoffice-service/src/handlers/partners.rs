//! Partner endpoints.

use crate::context::UserContext;
use crate::models::{CreatePartner, ListPartnersFilter, UpdatePartner};
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
    Json(input): Json<CreatePartner>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_editor()?;
    input.validate()?;

    let partner = state.db.create_partner(&input, &ctx).await?;
    Ok((StatusCode::CREATED, Json(partner)))
}

pub async fn get(
    State(state): State<AppState>,
    _ctx: UserContext,
    Path(partner_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let partner = state
        .db
        .get_partner(partner_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Partner not found")))?;
    Ok(Json(partner))
}

pub async fn list(
    State(state): State<AppState>,
    _ctx: UserContext,
    Query(filter): Query<ListPartnersFilter>,
) -> Result<impl IntoResponse, AppError> {
    let partners = state.db.list_partners(&filter).await?;
    Ok(Json(partners))
}

pub async fn update(
    State(state): State<AppState>,
    ctx: UserContext,
    Path(partner_id): Path<Uuid>,
    Json(input): Json<UpdatePartner>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_editor()?;
    input.validate()?;

    let partner = state
        .db
        .update_partner(partner_id, &input, &ctx)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Partner not found")))?;
    Ok(Json(partner))
}

/// Soft delete: the partner is marked inactive and its history stays.
pub async fn deactivate(
    State(state): State<AppState>,
    ctx: UserContext,
    Path(partner_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_admin()?;

    let partner = state
        .db
        .deactivate_partner(partner_id, &ctx)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Partner not found")))?;
    Ok(Json(partner))
}
