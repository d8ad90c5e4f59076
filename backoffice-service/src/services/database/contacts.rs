//! Contact operations.

use super::Database;
use crate::context::UserContext;
use crate::models::{Contact, CreateContact, ListContactsFilter, UpdateContact};
use crate::services::metrics::DB_QUERY_DURATION;
use backoffice_core::error::AppError;
use tracing::{info, instrument};
use uuid::Uuid;

const CONTACT_COLUMNS: &str = "contact_id, partner_id, first_name, last_name, email, phone, \
     position, notes, created_by, created_utc, modified_by, modified_utc";

impl Database {
    /// Create a contact under an existing partner.
    #[instrument(skip(self, input, ctx), fields(partner_id = %input.partner_id))]
    pub async fn create_contact(
        &self,
        input: &CreateContact,
        ctx: &UserContext,
    ) -> Result<Contact, AppError> {
        self.require_active_partner(input.partner_id).await?;

        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_contact"])
            .start_timer();

        let contact_id = Uuid::new_v4();
        let contact = sqlx::query_as::<_, Contact>(&format!(
            r#"
            INSERT INTO contacts (
                contact_id, partner_id, first_name, last_name, email, phone, position, notes, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {CONTACT_COLUMNS}
            "#
        ))
        .bind(contact_id)
        .bind(input.partner_id)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.position)
        .bind(&input.notes)
        .bind(ctx.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create contact: {}", e)))?;

        timer.observe_duration();

        info!(contact_id = %contact.contact_id, "Contact created");

        Ok(contact)
    }

    /// Get a contact by ID.
    #[instrument(skip(self), fields(contact_id = %contact_id))]
    pub async fn get_contact(&self, contact_id: Uuid) -> Result<Option<Contact>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_contact"])
            .start_timer();

        let contact = sqlx::query_as::<_, Contact>(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts WHERE contact_id = $1"
        ))
        .bind(contact_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get contact: {}", e)))?;

        timer.observe_duration();

        Ok(contact)
    }

    /// List contacts, optionally scoped to a partner.
    #[instrument(skip(self, filter))]
    pub async fn list_contacts(
        &self,
        filter: &ListContactsFilter,
    ) -> Result<Vec<Contact>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_contacts"])
            .start_timer();

        let limit = filter.page_size.clamp(1, 100) as i64;
        let search = filter
            .search
            .as_ref()
            .map(|s| format!("%{}%", s.to_lowercase()));

        let contacts = if let Some(cursor) = filter.page_token {
            sqlx::query_as::<_, Contact>(&format!(
                r#"
                SELECT {CONTACT_COLUMNS}
                FROM contacts
                WHERE ($1::uuid IS NULL OR partner_id = $1)
                  AND ($2::varchar IS NULL OR LOWER(first_name || ' ' || last_name) LIKE $2)
                  AND contact_id > $3
                ORDER BY contact_id
                LIMIT $4
                "#
            ))
            .bind(filter.partner_id)
            .bind(&search)
            .bind(cursor)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, Contact>(&format!(
                r#"
                SELECT {CONTACT_COLUMNS}
                FROM contacts
                WHERE ($1::uuid IS NULL OR partner_id = $1)
                  AND ($2::varchar IS NULL OR LOWER(first_name || ' ' || last_name) LIKE $2)
                ORDER BY contact_id
                LIMIT $3
                "#
            ))
            .bind(filter.partner_id)
            .bind(&search)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        }
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list contacts: {}", e)))?;

        timer.observe_duration();

        Ok(contacts)
    }

    /// Update a contact.
    #[instrument(skip(self, input, ctx), fields(contact_id = %contact_id))]
    pub async fn update_contact(
        &self,
        contact_id: Uuid,
        input: &UpdateContact,
        ctx: &UserContext,
    ) -> Result<Option<Contact>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_contact"])
            .start_timer();

        let contact = sqlx::query_as::<_, Contact>(&format!(
            r#"
            UPDATE contacts
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                email = COALESCE($4, email),
                phone = COALESCE($5, phone),
                position = COALESCE($6, position),
                notes = COALESCE($7, notes),
                modified_by = $8,
                modified_utc = NOW()
            WHERE contact_id = $1
            RETURNING {CONTACT_COLUMNS}
            "#
        ))
        .bind(contact_id)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.position)
        .bind(&input.notes)
        .bind(ctx.user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update contact: {}", e)))?;

        timer.observe_duration();

        Ok(contact)
    }

    /// Delete a contact.
    #[instrument(skip(self), fields(contact_id = %contact_id))]
    pub async fn delete_contact(&self, contact_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_contact"])
            .start_timer();

        let result = sqlx::query("DELETE FROM contacts WHERE contact_id = $1")
            .bind(contact_id)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                    AppError::Conflict(anyhow::anyhow!(
                        "Contact is referenced by other records and cannot be deleted"
                    ))
                }
                _ => AppError::DatabaseError(anyhow::anyhow!("Failed to delete contact: {}", e)),
            })?;

        timer.observe_duration();

        Ok(result.rows_affected() > 0)
    }
}
