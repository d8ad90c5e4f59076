//! Partner operations.

use super::Database;
use crate::context::UserContext;
use crate::models::{CreatePartner, ListPartnersFilter, Partner, UpdatePartner};
use crate::services::metrics::DB_QUERY_DURATION;
use backoffice_core::error::AppError;
use tracing::{info, instrument};
use uuid::Uuid;

const PARTNER_COLUMNS: &str = "partner_id, name, tax_number, address_line1, address_line2, city, \
     postal_code, country, email, phone, currency, active, created_by, created_utc, \
     modified_by, modified_utc";

impl Database {
    /// Create a new partner.
    #[instrument(skip(self, input, ctx), fields(user_id = %ctx.user_id))]
    pub async fn create_partner(
        &self,
        input: &CreatePartner,
        ctx: &UserContext,
    ) -> Result<Partner, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_partner"])
            .start_timer();

        let partner_id = Uuid::new_v4();
        let partner = sqlx::query_as::<_, Partner>(&format!(
            r#"
            INSERT INTO partners (
                partner_id, name, tax_number, address_line1, address_line2, city,
                postal_code, country, email, phone, currency, active, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, TRUE, $12)
            RETURNING {PARTNER_COLUMNS}
            "#
        ))
        .bind(partner_id)
        .bind(&input.name)
        .bind(&input.tax_number)
        .bind(&input.address_line1)
        .bind(&input.address_line2)
        .bind(&input.city)
        .bind(&input.postal_code)
        .bind(&input.country)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.currency)
        .bind(ctx.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create partner: {}", e)))?;

        timer.observe_duration();

        info!(partner_id = %partner.partner_id, name = %partner.name, "Partner created");

        Ok(partner)
    }

    /// Get a partner by ID.
    #[instrument(skip(self), fields(partner_id = %partner_id))]
    pub async fn get_partner(&self, partner_id: Uuid) -> Result<Option<Partner>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_partner"])
            .start_timer();

        let partner = sqlx::query_as::<_, Partner>(&format!(
            "SELECT {PARTNER_COLUMNS} FROM partners WHERE partner_id = $1"
        ))
        .bind(partner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get partner: {}", e)))?;

        timer.observe_duration();

        Ok(partner)
    }

    /// Get a partner that must exist and be active (reference validation).
    pub async fn require_active_partner(&self, partner_id: Uuid) -> Result<Partner, AppError> {
        let partner = self
            .get_partner(partner_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Partner not found")))?;
        if !partner.active {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Partner {} is inactive",
                partner_id
            )));
        }
        Ok(partner)
    }

    /// List partners with optional name search, cursor-paged by id.
    #[instrument(skip(self, filter))]
    pub async fn list_partners(
        &self,
        filter: &ListPartnersFilter,
    ) -> Result<Vec<Partner>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_partners"])
            .start_timer();

        let limit = filter.page_size.clamp(1, 100) as i64;
        let search = filter
            .search
            .as_ref()
            .map(|s| format!("%{}%", s.to_lowercase()));

        let partners = if let Some(cursor) = filter.page_token {
            sqlx::query_as::<_, Partner>(&format!(
                r#"
                SELECT {PARTNER_COLUMNS}
                FROM partners
                WHERE ($1::bool = TRUE OR active = TRUE)
                  AND ($2::varchar IS NULL OR LOWER(name) LIKE $2)
                  AND partner_id > $3
                ORDER BY partner_id
                LIMIT $4
                "#
            ))
            .bind(filter.include_inactive)
            .bind(&search)
            .bind(cursor)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, Partner>(&format!(
                r#"
                SELECT {PARTNER_COLUMNS}
                FROM partners
                WHERE ($1::bool = TRUE OR active = TRUE)
                  AND ($2::varchar IS NULL OR LOWER(name) LIKE $2)
                ORDER BY partner_id
                LIMIT $3
                "#
            ))
            .bind(filter.include_inactive)
            .bind(&search)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        }
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list partners: {}", e)))?;

        timer.observe_duration();

        Ok(partners)
    }

    /// Update a partner.
    #[instrument(skip(self, input, ctx), fields(partner_id = %partner_id))]
    pub async fn update_partner(
        &self,
        partner_id: Uuid,
        input: &UpdatePartner,
        ctx: &UserContext,
    ) -> Result<Option<Partner>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_partner"])
            .start_timer();

        let partner = sqlx::query_as::<_, Partner>(&format!(
            r#"
            UPDATE partners
            SET name = COALESCE($2, name),
                tax_number = COALESCE($3, tax_number),
                address_line1 = COALESCE($4, address_line1),
                address_line2 = COALESCE($5, address_line2),
                city = COALESCE($6, city),
                postal_code = COALESCE($7, postal_code),
                country = COALESCE($8, country),
                email = COALESCE($9, email),
                phone = COALESCE($10, phone),
                currency = COALESCE($11, currency),
                modified_by = $12,
                modified_utc = NOW()
            WHERE partner_id = $1
            RETURNING {PARTNER_COLUMNS}
            "#
        ))
        .bind(partner_id)
        .bind(&input.name)
        .bind(&input.tax_number)
        .bind(&input.address_line1)
        .bind(&input.address_line2)
        .bind(&input.city)
        .bind(&input.postal_code)
        .bind(&input.country)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.currency)
        .bind(ctx.user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update partner: {}", e)))?;

        timer.observe_duration();

        if let Some(ref p) = partner {
            info!(partner_id = %p.partner_id, "Partner updated");
        }

        Ok(partner)
    }

    /// Soft-delete a partner by flipping its active flag.
    ///
    /// Deactivating an already-inactive partner is an idempotent success.
    #[instrument(skip(self, ctx), fields(partner_id = %partner_id))]
    pub async fn deactivate_partner(
        &self,
        partner_id: Uuid,
        ctx: &UserContext,
    ) -> Result<Option<Partner>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["deactivate_partner"])
            .start_timer();

        let partner = sqlx::query_as::<_, Partner>(&format!(
            r#"
            UPDATE partners
            SET active = FALSE,
                modified_by = $2,
                modified_utc = CASE WHEN active THEN NOW() ELSE modified_utc END
            WHERE partner_id = $1
            RETURNING {PARTNER_COLUMNS}
            "#
        ))
        .bind(partner_id)
        .bind(ctx.user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to deactivate partner: {}", e))
        })?;

        timer.observe_duration();

        if let Some(ref p) = partner {
            info!(partner_id = %p.partner_id, "Partner deactivated");
        }

        Ok(partner)
    }
}
