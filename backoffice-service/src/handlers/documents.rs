//! Document metadata endpoints.

use crate::context::UserContext;
use crate::models::{CreateDocument, ListDocumentsFilter, UpdateDocument};
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
    Json(input): Json<CreateDocument>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_editor()?;
    input.validate()?;

    let document = state.db.create_document(&input, &ctx).await?;
    Ok((StatusCode::CREATED, Json(document)))
}

pub async fn get(
    State(state): State<AppState>,
    _ctx: UserContext,
    Path(document_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let document = state
        .db
        .get_document(document_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Document not found")))?;
    Ok(Json(document))
}

pub async fn list(
    State(state): State<AppState>,
    _ctx: UserContext,
    Query(filter): Query<ListDocumentsFilter>,
) -> Result<impl IntoResponse, AppError> {
    let documents = state.db.list_documents(&filter).await?;
    Ok(Json(documents))
}

pub async fn update(
    State(state): State<AppState>,
    ctx: UserContext,
    Path(document_id): Path<Uuid>,
    Json(input): Json<UpdateDocument>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_editor()?;
    input.validate()?;

    let document = state
        .db
        .update_document(document_id, &input)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Document not found")))?;
    Ok(Json(document))
}

pub async fn remove(
    State(state): State<AppState>,
    ctx: UserContext,
    Path(document_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_admin()?;

    if !state.db.delete_document(document_id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("Document not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}
