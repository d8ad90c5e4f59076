//! Order endpoints.

use crate::context::UserContext;
use crate::models::{CreateOrder, ListOrdersFilter, UpdateOrder};
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
    Json(input): Json<CreateOrder>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_editor()?;
    input.validate()?;

    let order = state.db.create_order(&input, &ctx).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn get(
    State(state): State<AppState>,
    _ctx: UserContext,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let order = state
        .db
        .get_order_with_items(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Order not found")))?;
    Ok(Json(order))
}

pub async fn list(
    State(state): State<AppState>,
    _ctx: UserContext,
    Query(filter): Query<ListOrdersFilter>,
) -> Result<impl IntoResponse, AppError> {
    let orders = state.db.list_orders(&filter).await?;
    Ok(Json(orders))
}

pub async fn update(
    State(state): State<AppState>,
    ctx: UserContext,
    Path(order_id): Path<Uuid>,
    Json(input): Json<UpdateOrder>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_editor()?;

    let order = state
        .db
        .update_order(order_id, &input, &ctx)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Order not found")))?;
    Ok(Json(order))
}

pub async fn cancel(
    State(state): State<AppState>,
    ctx: UserContext,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_admin()?;

    let order = state
        .db
        .cancel_order(order_id, &ctx)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Order not found")))?;
    Ok(Json(order))
}
