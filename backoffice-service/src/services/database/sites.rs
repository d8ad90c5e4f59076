//! Site operations. Sites soft-delete the same way partners do.

use super::Database;
use crate::context::UserContext;
use crate::models::{CreateSite, ListSitesFilter, Site, UpdateSite};
use crate::services::metrics::DB_QUERY_DURATION;
use backoffice_core::error::AppError;
use tracing::{info, instrument};
use uuid::Uuid;

const SITE_COLUMNS: &str = "site_id, partner_id, name, address_line1, address_line2, city, \
     postal_code, country, active, created_by, created_utc, modified_by, modified_utc";

impl Database {
    /// Create a site under an existing partner.
    #[instrument(skip(self, input, ctx), fields(partner_id = %input.partner_id))]
    pub async fn create_site(
        &self,
        input: &CreateSite,
        ctx: &UserContext,
    ) -> Result<Site, AppError> {
        self.require_active_partner(input.partner_id).await?;

        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_site"])
            .start_timer();

        let site_id = Uuid::new_v4();
        let site = sqlx::query_as::<_, Site>(&format!(
            r#"
            INSERT INTO sites (
                site_id, partner_id, name, address_line1, address_line2, city,
                postal_code, country, active, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE, $9)
            RETURNING {SITE_COLUMNS}
            "#
        ))
        .bind(site_id)
        .bind(input.partner_id)
        .bind(&input.name)
        .bind(&input.address_line1)
        .bind(&input.address_line2)
        .bind(&input.city)
        .bind(&input.postal_code)
        .bind(&input.country)
        .bind(ctx.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create site: {}", e)))?;

        timer.observe_duration();

        info!(site_id = %site.site_id, "Site created");

        Ok(site)
    }

    /// Get a site by ID.
    #[instrument(skip(self), fields(site_id = %site_id))]
    pub async fn get_site(&self, site_id: Uuid) -> Result<Option<Site>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_site"])
            .start_timer();

        let site = sqlx::query_as::<_, Site>(&format!(
            "SELECT {SITE_COLUMNS} FROM sites WHERE site_id = $1"
        ))
        .bind(site_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get site: {}", e)))?;

        timer.observe_duration();

        Ok(site)
    }

    /// List sites, optionally scoped to a partner.
    #[instrument(skip(self, filter))]
    pub async fn list_sites(&self, filter: &ListSitesFilter) -> Result<Vec<Site>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_sites"])
            .start_timer();

        let limit = filter.page_size.clamp(1, 100) as i64;

        let sites = if let Some(cursor) = filter.page_token {
            sqlx::query_as::<_, Site>(&format!(
                r#"
                SELECT {SITE_COLUMNS}
                FROM sites
                WHERE ($1::uuid IS NULL OR partner_id = $1)
                  AND ($2::bool = TRUE OR active = TRUE)
                  AND site_id > $3
                ORDER BY site_id
                LIMIT $4
                "#
            ))
            .bind(filter.partner_id)
            .bind(filter.include_inactive)
            .bind(cursor)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, Site>(&format!(
                r#"
                SELECT {SITE_COLUMNS}
                FROM sites
                WHERE ($1::uuid IS NULL OR partner_id = $1)
                  AND ($2::bool = TRUE OR active = TRUE)
                ORDER BY site_id
                LIMIT $3
                "#
            ))
            .bind(filter.partner_id)
            .bind(filter.include_inactive)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        }
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list sites: {}", e)))?;

        timer.observe_duration();

        Ok(sites)
    }

    /// Update a site.
    #[instrument(skip(self, input, ctx), fields(site_id = %site_id))]
    pub async fn update_site(
        &self,
        site_id: Uuid,
        input: &UpdateSite,
        ctx: &UserContext,
    ) -> Result<Option<Site>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_site"])
            .start_timer();

        let site = sqlx::query_as::<_, Site>(&format!(
            r#"
            UPDATE sites
            SET name = COALESCE($2, name),
                address_line1 = COALESCE($3, address_line1),
                address_line2 = COALESCE($4, address_line2),
                city = COALESCE($5, city),
                postal_code = COALESCE($6, postal_code),
                country = COALESCE($7, country),
                modified_by = $8,
                modified_utc = NOW()
            WHERE site_id = $1
            RETURNING {SITE_COLUMNS}
            "#
        ))
        .bind(site_id)
        .bind(&input.name)
        .bind(&input.address_line1)
        .bind(&input.address_line2)
        .bind(&input.city)
        .bind(&input.postal_code)
        .bind(&input.country)
        .bind(ctx.user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update site: {}", e)))?;

        timer.observe_duration();

        Ok(site)
    }

    /// Soft-delete a site; idempotent when already inactive.
    #[instrument(skip(self, ctx), fields(site_id = %site_id))]
    pub async fn deactivate_site(
        &self,
        site_id: Uuid,
        ctx: &UserContext,
    ) -> Result<Option<Site>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["deactivate_site"])
            .start_timer();

        let site = sqlx::query_as::<_, Site>(&format!(
            r#"
            UPDATE sites
            SET active = FALSE,
                modified_by = $2,
                modified_utc = CASE WHEN active THEN NOW() ELSE modified_utc END
            WHERE site_id = $1
            RETURNING {SITE_COLUMNS}
            "#
        ))
        .bind(site_id)
        .bind(ctx.user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to deactivate site: {}", e)))?;

        timer.observe_duration();

        if let Some(ref s) = site {
            info!(site_id = %s.site_id, "Site deactivated");
        }

        Ok(site)
    }
}
