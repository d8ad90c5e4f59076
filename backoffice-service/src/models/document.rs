//! Document metadata model.

use super::partner::default_page_size;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Document {
    pub document_id: Uuid,
    pub partner_id: Option<Uuid>,
    pub title: String,
    pub kind: String,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDocument {
    pub partner_id: Option<Uuid>,
    #[validate(length(min = 1, message = "Title cannot be empty"))]
    pub title: String,
    #[validate(length(min = 1, message = "Kind cannot be empty"))]
    pub kind: String,
    #[validate(length(min = 1, message = "File name cannot be empty"))]
    pub file_name: String,
    pub content_type: String,
    #[validate(range(min = 0, message = "Size cannot be negative"))]
    pub size_bytes: i64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateDocument {
    #[validate(length(min = 1, message = "Title cannot be empty"))]
    pub title: Option<String>,
    pub kind: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListDocumentsFilter {
    pub partner_id: Option<Uuid>,
    pub kind: Option<String>,
    pub search: Option<String>,
    #[serde(default = "default_page_size")]
    pub page_size: i32,
    pub page_token: Option<Uuid>,
}
