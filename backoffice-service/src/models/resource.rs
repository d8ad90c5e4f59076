//! Resource (company asset) model.

use super::partner::default_page_size;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    Available,
    Assigned,
    Retired,
}

impl ResourceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceStatus::Available => "available",
            ResourceStatus::Assigned => "assigned",
            ResourceStatus::Retired => "retired",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "assigned" => ResourceStatus::Assigned,
            "retired" => ResourceStatus::Retired,
            _ => ResourceStatus::Available,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Resource {
    pub resource_id: Uuid,
    pub name: String,
    pub kind: String,
    pub serial_number: Option<String>,
    /// Site the asset is currently assigned to, if any.
    pub site_id: Option<Uuid>,
    pub status: String,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_utc: DateTime<Utc>,
    pub modified_by: Option<Uuid>,
    pub modified_utc: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateResource {
    #[validate(length(min = 1, message = "Resource name cannot be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "Kind cannot be empty"))]
    pub kind: String,
    pub serial_number: Option<String>,
    pub site_id: Option<Uuid>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateResource {
    #[validate(length(min = 1, message = "Resource name cannot be empty"))]
    pub name: Option<String>,
    pub kind: Option<String>,
    pub serial_number: Option<String>,
    pub site_id: Option<Uuid>,
    pub status: Option<ResourceStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListResourcesFilter {
    pub site_id: Option<Uuid>,
    pub status: Option<ResourceStatus>,
    pub search: Option<String>,
    #[serde(default = "default_page_size")]
    pub page_size: i32,
    pub page_token: Option<Uuid>,
}
