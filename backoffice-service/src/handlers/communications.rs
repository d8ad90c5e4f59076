//! Communication log endpoints.
//!
//! An outbound email entry with `send_email` set is delivered through the
//! configured SMTP transport before it is persisted; the stored status
//! records the delivery outcome (`sent` or `failed`), everything else is
//! `logged`.

use crate::context::UserContext;
use crate::models::{
    CommunicationChannel, CommunicationDirection, CreateCommunication, ListCommunicationsFilter,
};
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use backoffice_core::error::AppError;
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

pub async fn create(
    State(state): State<AppState>,
    ctx: UserContext,
    Json(input): Json<CreateCommunication>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_editor()?;
    input.validate()?;

    state.db.require_active_partner(input.partner_id).await?;

    let contact = match input.contact_id {
        Some(contact_id) => {
            let contact = state
                .db
                .get_contact(contact_id)
                .await?
                .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Contact not found")))?;
            if contact.partner_id != input.partner_id {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Contact belongs to a different partner"
                )));
            }
            Some(contact)
        }
        None => None,
    };

    let deliver = input.send_email
        && input.channel == CommunicationChannel::Email
        && input.direction == CommunicationDirection::Outbound;

    let (status, sent_utc) = if deliver {
        let to = contact
            .as_ref()
            .and_then(|c| c.email.as_deref())
            .ok_or_else(|| {
                AppError::BadRequest(anyhow::anyhow!(
                    "Sending an email requires a contact with an email address"
                ))
            })?;
        let body = input.body.as_deref().unwrap_or_default();

        match state.mailer.send(to, &input.subject, body).await {
            Ok(_) => ("sent", Some(Utc::now())),
            Err(e) => {
                tracing::error!(error = %e, to = %to, "Email delivery failed");
                ("failed", None)
            }
        }
    } else {
        ("logged", None)
    };

    let communication = state
        .db
        .create_communication(&input, status, sent_utc, &ctx)
        .await?;
    Ok((StatusCode::CREATED, Json(communication)))
}

pub async fn get(
    State(state): State<AppState>,
    _ctx: UserContext,
    Path(communication_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let communication = state
        .db
        .get_communication(communication_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Communication not found")))?;
    Ok(Json(communication))
}

pub async fn list(
    State(state): State<AppState>,
    _ctx: UserContext,
    Query(filter): Query<ListCommunicationsFilter>,
) -> Result<impl IntoResponse, AppError> {
    let communications = state.db.list_communications(&filter).await?;
    Ok(Json(communications))
}
