//! VAT type model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VatType {
    pub vat_type_id: Uuid,
    pub name: String,
    /// Rate as a percentage, e.g. 27 for 27%.
    pub rate: Decimal,
    pub created_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateVatType {
    #[validate(length(min = 1, message = "VAT type name cannot be empty"))]
    pub name: String,
    pub rate: Decimal,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateVatType {
    #[validate(length(min = 1, message = "VAT type name cannot be empty"))]
    pub name: Option<String>,
    pub rate: Option<Decimal>,
}
