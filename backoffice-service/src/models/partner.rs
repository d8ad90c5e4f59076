//! Partner (customer) model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Partner master record. Soft-deleted via the `active` flag.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Partner {
    pub partner_id: Uuid,
    pub name: String,
    pub tax_number: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub currency: String,
    pub active: bool,
    pub created_by: Uuid,
    pub created_utc: DateTime<Utc>,
    pub modified_by: Option<Uuid>,
    pub modified_utc: Option<DateTime<Utc>>,
}

/// Input for creating a partner.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePartner {
    #[validate(length(min = 1, message = "Partner name cannot be empty"))]
    pub name: String,
    pub tax_number: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    #[validate(length(equal = 3, message = "Currency must be a 3-letter code"))]
    pub currency: String,
}

/// Input for updating a partner. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdatePartner {
    #[validate(length(min = 1, message = "Partner name cannot be empty"))]
    pub name: Option<String>,
    pub tax_number: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    #[validate(length(equal = 3, message = "Currency must be a 3-letter code"))]
    pub currency: Option<String>,
}

/// Filter parameters for listing partners.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListPartnersFilter {
    /// Case-insensitive substring match on name.
    pub search: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
    #[serde(default = "default_page_size")]
    pub page_size: i32,
    pub page_token: Option<Uuid>,
}

pub(crate) fn default_page_size() -> i32 {
    50
}
