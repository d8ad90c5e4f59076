//! Quote endpoints, including the line-item and lifecycle routes.

use crate::context::UserContext;
use crate::models::{CreateQuote, CreateQuoteItem, ListQuotesFilter, QuoteStatus, UpdateQuote};
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
    Json(input): Json<CreateQuote>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_editor()?;
    input.validate()?;

    let quote = state.db.create_quote(&input, &ctx).await?;
    Ok((StatusCode::CREATED, Json(quote)))
}

pub async fn get(
    State(state): State<AppState>,
    _ctx: UserContext,
    Path(quote_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let quote = state
        .db
        .get_quote_with_items(quote_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Quote not found")))?;
    Ok(Json(quote))
}

pub async fn list(
    State(state): State<AppState>,
    _ctx: UserContext,
    Query(filter): Query<ListQuotesFilter>,
) -> Result<impl IntoResponse, AppError> {
    let quotes = state.db.list_quotes(&filter).await?;
    Ok(Json(quotes))
}

pub async fn update(
    State(state): State<AppState>,
    ctx: UserContext,
    Path(quote_id): Path<Uuid>,
    Json(input): Json<UpdateQuote>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_editor()?;

    let quote = state
        .db
        .update_quote(quote_id, &input, &ctx)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Quote not found")))?;
    Ok(Json(quote))
}

pub async fn add_item(
    State(state): State<AppState>,
    ctx: UserContext,
    Path(quote_id): Path<Uuid>,
    Json(input): Json<CreateQuoteItem>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_editor()?;
    input.validate()?;

    let quote = state.db.add_quote_item(quote_id, &input).await?;
    Ok((StatusCode::CREATED, Json(quote)))
}

pub async fn update_item(
    State(state): State<AppState>,
    ctx: UserContext,
    Path((quote_id, quote_item_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<CreateQuoteItem>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_editor()?;
    input.validate()?;

    let quote = state
        .db
        .update_quote_item(quote_id, quote_item_id, &input)
        .await?;
    Ok(Json(quote))
}

pub async fn remove_item(
    State(state): State<AppState>,
    ctx: UserContext,
    Path((quote_id, quote_item_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_editor()?;

    let quote = state.db.remove_quote_item(quote_id, quote_item_id).await?;
    Ok(Json(quote))
}

pub async fn send(
    State(state): State<AppState>,
    ctx: UserContext,
    Path(quote_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_editor()?;

    let quote = state
        .db
        .set_quote_status(quote_id, QuoteStatus::Sent, &ctx)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Quote not found")))?;
    Ok(Json(quote))
}

pub async fn accept(
    State(state): State<AppState>,
    ctx: UserContext,
    Path(quote_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_editor()?;

    let quote = state
        .db
        .set_quote_status(quote_id, QuoteStatus::Accepted, &ctx)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Quote not found")))?;
    Ok(Json(quote))
}

pub async fn decline(
    State(state): State<AppState>,
    ctx: UserContext,
    Path(quote_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_editor()?;

    let quote = state
        .db
        .set_quote_status(quote_id, QuoteStatus::Declined, &ctx)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Quote not found")))?;
    Ok(Json(quote))
}

pub async fn remove(
    State(state): State<AppState>,
    ctx: UserContext,
    Path(quote_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_admin()?;

    // Only drafts may be removed; anything sent stays on record.
    let quote = state
        .db
        .get_quote(quote_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Quote not found")))?;
    if quote.status != QuoteStatus::Draft.as_str() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Only draft quotes can be deleted"
        )));
    }

    state.db.delete_quote(quote_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
