//! Customer communication log.

use super::partner::default_page_size;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommunicationChannel {
    Email,
    Phone,
    Meeting,
    Note,
}

impl CommunicationChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommunicationChannel::Email => "email",
            CommunicationChannel::Phone => "phone",
            CommunicationChannel::Meeting => "meeting",
            CommunicationChannel::Note => "note",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommunicationDirection {
    Outbound,
    Inbound,
}

impl CommunicationDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommunicationDirection::Outbound => "outbound",
            CommunicationDirection::Inbound => "inbound",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Communication {
    pub communication_id: Uuid,
    pub partner_id: Uuid,
    pub contact_id: Option<Uuid>,
    pub channel: String,
    pub direction: String,
    pub subject: String,
    pub body: Option<String>,
    /// `logged`, `sent`, or `failed`.
    pub status: String,
    pub sent_utc: Option<DateTime<Utc>>,
    pub created_by: Uuid,
    pub created_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCommunication {
    pub partner_id: Uuid,
    pub contact_id: Option<Uuid>,
    pub channel: CommunicationChannel,
    pub direction: CommunicationDirection,
    #[validate(length(min = 1, message = "Subject cannot be empty"))]
    pub subject: String,
    pub body: Option<String>,
    /// For outbound email: deliver through SMTP in addition to logging.
    #[serde(default)]
    pub send_email: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListCommunicationsFilter {
    pub partner_id: Option<Uuid>,
    pub contact_id: Option<Uuid>,
    pub channel: Option<CommunicationChannel>,
    #[serde(default = "default_page_size")]
    pub page_size: i32,
    pub page_token: Option<Uuid>,
}
