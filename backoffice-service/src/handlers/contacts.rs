//! Contact endpoints.

use crate::context::UserContext;
use crate::models::{CreateContact, ListContactsFilter, UpdateContact};
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
    Json(input): Json<CreateContact>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_editor()?;
    input.validate()?;

    let contact = state.db.create_contact(&input, &ctx).await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

pub async fn get(
    State(state): State<AppState>,
    _ctx: UserContext,
    Path(contact_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let contact = state
        .db
        .get_contact(contact_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Contact not found")))?;
    Ok(Json(contact))
}

pub async fn list(
    State(state): State<AppState>,
    _ctx: UserContext,
    Query(filter): Query<ListContactsFilter>,
) -> Result<impl IntoResponse, AppError> {
    let contacts = state.db.list_contacts(&filter).await?;
    Ok(Json(contacts))
}

pub async fn update(
    State(state): State<AppState>,
    ctx: UserContext,
    Path(contact_id): Path<Uuid>,
    Json(input): Json<UpdateContact>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_editor()?;
    input.validate()?;

    let contact = state
        .db
        .update_contact(contact_id, &input, &ctx)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Contact not found")))?;
    Ok(Json(contact))
}

pub async fn remove(
    State(state): State<AppState>,
    ctx: UserContext,
    Path(contact_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_admin()?;

    if !state.db.delete_contact(contact_id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("Contact not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}
