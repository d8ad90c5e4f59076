//! Document metadata operations. Only metadata is stored; the binary
//! content lives outside this service.

use super::Database;
use crate::context::UserContext;
use crate::models::{CreateDocument, Document, ListDocumentsFilter, UpdateDocument};
use crate::services::metrics::DB_QUERY_DURATION;
use backoffice_core::error::AppError;
use tracing::{info, instrument};
use uuid::Uuid;

const DOCUMENT_COLUMNS: &str = "document_id, partner_id, title, kind, file_name, content_type, \
     size_bytes, notes, created_by, created_utc";

impl Database {
    /// Register a document's metadata.
    #[instrument(skip(self, input, ctx))]
    pub async fn create_document(
        &self,
        input: &CreateDocument,
        ctx: &UserContext,
    ) -> Result<Document, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_document"])
            .start_timer();

        if let Some(partner_id) = input.partner_id {
            self.require_active_partner(partner_id).await?;
        }

        let document = sqlx::query_as::<_, Document>(&format!(
            r#"
            INSERT INTO documents (
                document_id, partner_id, title, kind, file_name, content_type,
                size_bytes, notes, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {DOCUMENT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(input.partner_id)
        .bind(&input.title)
        .bind(&input.kind)
        .bind(&input.file_name)
        .bind(&input.content_type)
        .bind(input.size_bytes)
        .bind(&input.notes)
        .bind(ctx.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to create document: {}", e))
        })?;

        timer.observe_duration();

        info!(document_id = %document.document_id, "Document registered");

        Ok(document)
    }

    /// Get document metadata by ID.
    #[instrument(skip(self), fields(document_id = %document_id))]
    pub async fn get_document(&self, document_id: Uuid) -> Result<Option<Document>, AppError> {
        let document = sqlx::query_as::<_, Document>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE document_id = $1"
        ))
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get document: {}", e)))?;

        Ok(document)
    }

    /// List documents.
    #[instrument(skip(self, filter))]
    pub async fn list_documents(
        &self,
        filter: &ListDocumentsFilter,
    ) -> Result<Vec<Document>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_documents"])
            .start_timer();

        let limit = filter.page_size.clamp(1, 100) as i64;
        let search = filter.search.as_ref().map(|s| format!("%{}%", s.to_lowercase()));

        let documents = if let Some(cursor) = filter.page_token {
            sqlx::query_as::<_, Document>(&format!(
                r#"
                SELECT {DOCUMENT_COLUMNS}
                FROM documents
                WHERE ($1::uuid IS NULL OR partner_id = $1)
                  AND ($2::varchar IS NULL OR kind = $2)
                  AND ($3::varchar IS NULL OR LOWER(title) LIKE $3 OR LOWER(file_name) LIKE $3)
                  AND document_id > $4
                ORDER BY document_id
                LIMIT $5
                "#
            ))
            .bind(filter.partner_id)
            .bind(&filter.kind)
            .bind(&search)
            .bind(cursor)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, Document>(&format!(
                r#"
                SELECT {DOCUMENT_COLUMNS}
                FROM documents
                WHERE ($1::uuid IS NULL OR partner_id = $1)
                  AND ($2::varchar IS NULL OR kind = $2)
                  AND ($3::varchar IS NULL OR LOWER(title) LIKE $3 OR LOWER(file_name) LIKE $3)
                ORDER BY document_id
                LIMIT $4
                "#
            ))
            .bind(filter.partner_id)
            .bind(&filter.kind)
            .bind(&search)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        }
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list documents: {}", e)))?;

        timer.observe_duration();

        Ok(documents)
    }

    /// Update document metadata.
    #[instrument(skip(self, input), fields(document_id = %document_id))]
    pub async fn update_document(
        &self,
        document_id: Uuid,
        input: &UpdateDocument,
    ) -> Result<Option<Document>, AppError> {
        let document = sqlx::query_as::<_, Document>(&format!(
            r#"
            UPDATE documents
            SET title = COALESCE($2, title),
                kind = COALESCE($3, kind),
                notes = COALESCE($4, notes)
            WHERE document_id = $1
            RETURNING {DOCUMENT_COLUMNS}
            "#
        ))
        .bind(document_id)
        .bind(&input.title)
        .bind(&input.kind)
        .bind(&input.notes)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update document: {}", e))
        })?;

        Ok(document)
    }

    /// Remove a document's metadata record.
    #[instrument(skip(self), fields(document_id = %document_id))]
    pub async fn delete_document(&self, document_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM documents WHERE document_id = $1")
            .bind(document_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete document: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }
}
