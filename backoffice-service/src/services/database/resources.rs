//! Resource (company asset) operations.

use super::Database;
use crate::context::UserContext;
use crate::models::{CreateResource, ListResourcesFilter, Resource, UpdateResource};
use crate::services::metrics::DB_QUERY_DURATION;
use backoffice_core::error::AppError;
use tracing::{info, instrument};
use uuid::Uuid;

const RESOURCE_COLUMNS: &str = "resource_id, name, kind, serial_number, site_id, status, notes, \
     created_by, created_utc, modified_by, modified_utc";

impl Database {
    /// Register an asset. A site assignment marks it `assigned` from the
    /// start, otherwise it is `available`.
    #[instrument(skip(self, input, ctx))]
    pub async fn create_resource(
        &self,
        input: &CreateResource,
        ctx: &UserContext,
    ) -> Result<Resource, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_resource"])
            .start_timer();

        if let Some(site_id) = input.site_id {
            self.get_site(site_id)
                .await?
                .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Site not found")))?;
        }

        let status = if input.site_id.is_some() {
            "assigned"
        } else {
            "available"
        };

        let resource = sqlx::query_as::<_, Resource>(&format!(
            r#"
            INSERT INTO resources (
                resource_id, name, kind, serial_number, site_id, status, notes, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {RESOURCE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.kind)
        .bind(&input.serial_number)
        .bind(input.site_id)
        .bind(status)
        .bind(&input.notes)
        .bind(ctx.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to create resource: {}", e))
        })?;

        timer.observe_duration();

        info!(resource_id = %resource.resource_id, "Resource registered");

        Ok(resource)
    }

    /// Get a resource by ID.
    #[instrument(skip(self), fields(resource_id = %resource_id))]
    pub async fn get_resource(&self, resource_id: Uuid) -> Result<Option<Resource>, AppError> {
        let resource = sqlx::query_as::<_, Resource>(&format!(
            "SELECT {RESOURCE_COLUMNS} FROM resources WHERE resource_id = $1"
        ))
        .bind(resource_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get resource: {}", e)))?;

        Ok(resource)
    }

    /// List resources.
    #[instrument(skip(self, filter))]
    pub async fn list_resources(
        &self,
        filter: &ListResourcesFilter,
    ) -> Result<Vec<Resource>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_resources"])
            .start_timer();

        let limit = filter.page_size.clamp(1, 100) as i64;
        let status = filter.status.map(|s| s.as_str().to_string());
        let search = filter.search.as_ref().map(|s| format!("%{}%", s.to_lowercase()));

        let resources = if let Some(cursor) = filter.page_token {
            sqlx::query_as::<_, Resource>(&format!(
                r#"
                SELECT {RESOURCE_COLUMNS}
                FROM resources
                WHERE ($1::uuid IS NULL OR site_id = $1)
                  AND ($2::varchar IS NULL OR status = $2)
                  AND ($3::varchar IS NULL OR LOWER(name) LIKE $3 OR LOWER(serial_number) LIKE $3)
                  AND resource_id > $4
                ORDER BY resource_id
                LIMIT $5
                "#
            ))
            .bind(filter.site_id)
            .bind(&status)
            .bind(&search)
            .bind(cursor)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, Resource>(&format!(
                r#"
                SELECT {RESOURCE_COLUMNS}
                FROM resources
                WHERE ($1::uuid IS NULL OR site_id = $1)
                  AND ($2::varchar IS NULL OR status = $2)
                  AND ($3::varchar IS NULL OR LOWER(name) LIKE $3 OR LOWER(serial_number) LIKE $3)
                ORDER BY resource_id
                LIMIT $4
                "#
            ))
            .bind(filter.site_id)
            .bind(&status)
            .bind(&search)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        }
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list resources: {}", e)))?;

        timer.observe_duration();

        Ok(resources)
    }

    /// Update a resource. Assigning a site moves it to `assigned`; clearing
    /// the assignment is done by setting status back to `available`.
    #[instrument(skip(self, input, ctx), fields(resource_id = %resource_id))]
    pub async fn update_resource(
        &self,
        resource_id: Uuid,
        input: &UpdateResource,
        ctx: &UserContext,
    ) -> Result<Option<Resource>, AppError> {
        if let Some(site_id) = input.site_id {
            self.get_site(site_id)
                .await?
                .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Site not found")))?;
        }

        let status = input
            .status
            .map(|s| s.as_str().to_string())
            .or_else(|| input.site_id.map(|_| "assigned".to_string()));

        let resource = sqlx::query_as::<_, Resource>(&format!(
            r#"
            UPDATE resources
            SET name = COALESCE($2, name),
                kind = COALESCE($3, kind),
                serial_number = COALESCE($4, serial_number),
                site_id = CASE WHEN $7 = 'available' OR $7 = 'retired' THEN NULL
                               ELSE COALESCE($5, site_id) END,
                status = COALESCE($7, status),
                notes = COALESCE($6, notes),
                modified_by = $8,
                modified_utc = NOW()
            WHERE resource_id = $1
            RETURNING {RESOURCE_COLUMNS}
            "#
        ))
        .bind(resource_id)
        .bind(&input.name)
        .bind(&input.kind)
        .bind(&input.serial_number)
        .bind(input.site_id)
        .bind(&input.notes)
        .bind(&status)
        .bind(ctx.user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update resource: {}", e))
        })?;

        if let Some(ref r) = resource {
            info!(resource_id = %r.resource_id, status = %r.status, "Resource updated");
        }

        Ok(resource)
    }

    /// Remove a resource record.
    #[instrument(skip(self), fields(resource_id = %resource_id))]
    pub async fn delete_resource(&self, resource_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM resources WHERE resource_id = $1")
            .bind(resource_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete resource: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }
}
