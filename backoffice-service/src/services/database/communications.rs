//! Communication log operations. Delivery (when requested) happens before
//! the row is written, so the stored status reflects the actual outcome.

use super::Database;
use crate::context::UserContext;
use crate::models::{Communication, CreateCommunication, ListCommunicationsFilter};
use crate::services::metrics::DB_QUERY_DURATION;
use backoffice_core::error::AppError;
use chrono::{DateTime, Utc};
use tracing::{info, instrument};
use uuid::Uuid;

const COMMUNICATION_COLUMNS: &str = "communication_id, partner_id, contact_id, channel, \
     direction, subject, body, status, sent_utc, created_by, created_utc";

impl Database {
    /// Log a communication with the outcome the caller determined.
    /// `status` is `logged`, `sent`, or `failed`.
    #[instrument(skip(self, input, ctx), fields(partner_id = %input.partner_id))]
    pub async fn create_communication(
        &self,
        input: &CreateCommunication,
        status: &str,
        sent_utc: Option<DateTime<Utc>>,
        ctx: &UserContext,
    ) -> Result<Communication, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_communication"])
            .start_timer();

        let communication = sqlx::query_as::<_, Communication>(&format!(
            r#"
            INSERT INTO communications (
                communication_id, partner_id, contact_id, channel, direction,
                subject, body, status, sent_utc, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {COMMUNICATION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(input.partner_id)
        .bind(input.contact_id)
        .bind(input.channel.as_str())
        .bind(input.direction.as_str())
        .bind(&input.subject)
        .bind(&input.body)
        .bind(status)
        .bind(sent_utc)
        .bind(ctx.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to log communication: {}", e))
        })?;

        timer.observe_duration();

        info!(
            communication_id = %communication.communication_id,
            channel = %communication.channel,
            status = %communication.status,
            "Communication logged"
        );

        Ok(communication)
    }

    /// Get one communication entry.
    #[instrument(skip(self), fields(communication_id = %communication_id))]
    pub async fn get_communication(
        &self,
        communication_id: Uuid,
    ) -> Result<Option<Communication>, AppError> {
        let communication = sqlx::query_as::<_, Communication>(&format!(
            "SELECT {COMMUNICATION_COLUMNS} FROM communications WHERE communication_id = $1"
        ))
        .bind(communication_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get communication: {}", e))
        })?;

        Ok(communication)
    }

    /// List communications, cursor-paged by id.
    #[instrument(skip(self, filter))]
    pub async fn list_communications(
        &self,
        filter: &ListCommunicationsFilter,
    ) -> Result<Vec<Communication>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_communications"])
            .start_timer();

        let limit = filter.page_size.clamp(1, 100) as i64;
        let channel = filter.channel.map(|c| c.as_str().to_string());

        let communications = if let Some(cursor) = filter.page_token {
            sqlx::query_as::<_, Communication>(&format!(
                r#"
                SELECT {COMMUNICATION_COLUMNS}
                FROM communications
                WHERE ($1::uuid IS NULL OR partner_id = $1)
                  AND ($2::uuid IS NULL OR contact_id = $2)
                  AND ($3::varchar IS NULL OR channel = $3)
                  AND communication_id > $4
                ORDER BY communication_id
                LIMIT $5
                "#
            ))
            .bind(filter.partner_id)
            .bind(filter.contact_id)
            .bind(&channel)
            .bind(cursor)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, Communication>(&format!(
                r#"
                SELECT {COMMUNICATION_COLUMNS}
                FROM communications
                WHERE ($1::uuid IS NULL OR partner_id = $1)
                  AND ($2::uuid IS NULL OR contact_id = $2)
                  AND ($3::varchar IS NULL OR channel = $3)
                ORDER BY communication_id
                LIMIT $4
                "#
            ))
            .bind(filter.partner_id)
            .bind(filter.contact_id)
            .bind(&channel)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        }
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list communications: {}", e))
        })?;

        timer.observe_duration();

        Ok(communications)
    }
}
