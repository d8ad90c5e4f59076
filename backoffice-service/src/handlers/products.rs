//! Product price, partner override price, and VAT type endpoints.

use crate::context::UserContext;
use crate::models::{
    CreateProductPrice, CreateVatType, ListProductPricesFilter, SetPartnerProductPrice,
    UpdateProductPrice, UpdateVatType,
};
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use backoffice_core::error::AppError;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

pub async fn create(
    State(state): State<AppState>,
    ctx: UserContext,
    Json(input): Json<CreateProductPrice>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_editor()?;
    input.validate()?;

    if input.sales_price < Decimal::ZERO {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Sales price must not be negative"
        )));
    }

    let price = state.db.create_product_price(&input).await?;
    Ok((StatusCode::CREATED, Json(price)))
}

pub async fn get(
    State(state): State<AppState>,
    _ctx: UserContext,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let price = state
        .db
        .get_product_price(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product price not found")))?;
    Ok(Json(price))
}

pub async fn list(
    State(state): State<AppState>,
    _ctx: UserContext,
    Query(filter): Query<ListProductPricesFilter>,
) -> Result<impl IntoResponse, AppError> {
    let prices = state.db.list_product_prices(&filter).await?;
    Ok(Json(prices))
}

pub async fn update(
    State(state): State<AppState>,
    ctx: UserContext,
    Path(product_id): Path<Uuid>,
    Json(input): Json<UpdateProductPrice>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_editor()?;
    input.validate()?;

    if matches!(input.sales_price, Some(p) if p < Decimal::ZERO) {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Sales price must not be negative"
        )));
    }

    let price = state
        .db
        .update_product_price(product_id, &input)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product price not found")))?;
    Ok(Json(price))
}

#[derive(Debug, Deserialize)]
pub struct SetPartnerPriceBody {
    pub product_id: Uuid,
    #[serde(flatten)]
    pub price: SetPartnerProductPrice,
}

/// Upsert a partner's agreed price for one product.
pub async fn set_partner_price(
    State(state): State<AppState>,
    ctx: UserContext,
    Path(partner_id): Path<Uuid>,
    Json(input): Json<SetPartnerPriceBody>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_editor()?;

    if input.price.price < Decimal::ZERO {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Partner price must not be negative"
        )));
    }

    state.db.require_active_partner(partner_id).await?;
    state.db.require_active_product_price(input.product_id).await?;

    let price = state
        .db
        .set_partner_product_price(partner_id, input.product_id, input.price.price)
        .await?;
    Ok(Json(price))
}

pub async fn delete_partner_price(
    State(state): State<AppState>,
    ctx: UserContext,
    Path((partner_id, product_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_admin()?;

    if !state
        .db
        .delete_partner_product_price(partner_id, product_id)
        .await?
    {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "Partner price not found"
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_vat_type(
    State(state): State<AppState>,
    ctx: UserContext,
    Json(input): Json<CreateVatType>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_admin()?;
    input.validate()?;

    let vat_type = state.db.create_vat_type(&input).await?;
    Ok((StatusCode::CREATED, Json(vat_type)))
}

pub async fn list_vat_types(
    State(state): State<AppState>,
    _ctx: UserContext,
) -> Result<impl IntoResponse, AppError> {
    let vat_types = state.db.list_vat_types().await?;
    Ok(Json(vat_types))
}

pub async fn delete_vat_type(
    State(state): State<AppState>,
    ctx: UserContext,
    Path(vat_type_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_admin()?;

    if !state.db.delete_vat_type(vat_type_id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("VAT type not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_vat_type(
    State(state): State<AppState>,
    ctx: UserContext,
    Path(vat_type_id): Path<Uuid>,
    Json(input): Json<UpdateVatType>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_admin()?;
    input.validate()?;

    let vat_type = state
        .db
        .update_vat_type(vat_type_id, &input)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("VAT type not found")))?;
    Ok(Json(vat_type))
}
