//! Product price, partner override price, and VAT type operations.

use super::Database;
use crate::models::{
    CreateProductPrice, CreateVatType, ListProductPricesFilter, PartnerProductPrice, ProductPrice,
    UpdateProductPrice, UpdateVatType, VatType,
};
use crate::services::metrics::DB_QUERY_DURATION;
use backoffice_core::error::AppError;
use rust_decimal::Decimal;
use tracing::{info, instrument};
use uuid::Uuid;

const PRODUCT_COLUMNS: &str = "product_id, name, sales_price, currency, tier1_qty, tier1_price, \
     tier2_qty, tier2_price, tier3_qty, tier3_price, active, created_utc, modified_utc";

impl Database {
    /// Create a product price record.
    #[instrument(skip(self, input))]
    pub async fn create_product_price(
        &self,
        input: &CreateProductPrice,
    ) -> Result<ProductPrice, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_product_price"])
            .start_timer();

        let product_id = Uuid::new_v4();
        let price = sqlx::query_as::<_, ProductPrice>(&format!(
            r#"
            INSERT INTO product_prices (
                product_id, name, sales_price, currency, tier1_qty, tier1_price,
                tier2_qty, tier2_price, tier3_qty, tier3_price, active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, TRUE)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(product_id)
        .bind(&input.name)
        .bind(input.sales_price)
        .bind(&input.currency)
        .bind(input.tier1_qty)
        .bind(input.tier1_price)
        .bind(input.tier2_qty)
        .bind(input.tier2_price)
        .bind(input.tier3_qty)
        .bind(input.tier3_price)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to create product price: {}", e))
        })?;

        timer.observe_duration();

        info!(product_id = %price.product_id, name = %price.name, "Product price created");

        Ok(price)
    }

    /// Get a product price by ID.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_product_price(
        &self,
        product_id: Uuid,
    ) -> Result<Option<ProductPrice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_product_price"])
            .start_timer();

        let price = sqlx::query_as::<_, ProductPrice>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product_prices WHERE product_id = $1"
        ))
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get product price: {}", e))
        })?;

        timer.observe_duration();

        Ok(price)
    }

    /// Get a product price that must exist and be active (reference
    /// validation for quote/order lines).
    pub async fn require_active_product_price(
        &self,
        product_id: Uuid,
    ) -> Result<ProductPrice, AppError> {
        let price = self
            .get_product_price(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product not found")))?;
        if !price.active {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Product {} has no active price",
                product_id
            )));
        }
        Ok(price)
    }

    /// List product prices.
    #[instrument(skip(self, filter))]
    pub async fn list_product_prices(
        &self,
        filter: &ListProductPricesFilter,
    ) -> Result<Vec<ProductPrice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_product_prices"])
            .start_timer();

        let limit = filter.page_size.clamp(1, 100) as i64;
        let search = filter
            .search
            .as_ref()
            .map(|s| format!("%{}%", s.to_lowercase()));

        let prices = if let Some(cursor) = filter.page_token {
            sqlx::query_as::<_, ProductPrice>(&format!(
                r#"
                SELECT {PRODUCT_COLUMNS}
                FROM product_prices
                WHERE ($1::bool = TRUE OR active = TRUE)
                  AND ($2::varchar IS NULL OR LOWER(name) LIKE $2)
                  AND product_id > $3
                ORDER BY product_id
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
            sqlx::query_as::<_, ProductPrice>(&format!(
                r#"
                SELECT {PRODUCT_COLUMNS}
                FROM product_prices
                WHERE ($1::bool = TRUE OR active = TRUE)
                  AND ($2::varchar IS NULL OR LOWER(name) LIKE $2)
                ORDER BY product_id
                LIMIT $3
                "#
            ))
            .bind(filter.include_inactive)
            .bind(&search)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        }
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list product prices: {}", e))
        })?;

        timer.observe_duration();

        Ok(prices)
    }

    /// Update a product price.
    #[instrument(skip(self, input), fields(product_id = %product_id))]
    pub async fn update_product_price(
        &self,
        product_id: Uuid,
        input: &UpdateProductPrice,
    ) -> Result<Option<ProductPrice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_product_price"])
            .start_timer();

        let price = sqlx::query_as::<_, ProductPrice>(&format!(
            r#"
            UPDATE product_prices
            SET name = COALESCE($2, name),
                sales_price = COALESCE($3, sales_price),
                tier1_qty = COALESCE($4, tier1_qty),
                tier1_price = COALESCE($5, tier1_price),
                tier2_qty = COALESCE($6, tier2_qty),
                tier2_price = COALESCE($7, tier2_price),
                tier3_qty = COALESCE($8, tier3_qty),
                tier3_price = COALESCE($9, tier3_price),
                active = COALESCE($10, active),
                modified_utc = NOW()
            WHERE product_id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(product_id)
        .bind(&input.name)
        .bind(input.sales_price)
        .bind(input.tier1_qty)
        .bind(input.tier1_price)
        .bind(input.tier2_qty)
        .bind(input.tier2_price)
        .bind(input.tier3_qty)
        .bind(input.tier3_price)
        .bind(input.active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update product price: {}", e))
        })?;

        timer.observe_duration();

        Ok(price)
    }

    // -------------------------------------------------------------------------
    // Partner Product Price Operations
    // -------------------------------------------------------------------------

    /// Look up a partner's override price for a product.
    #[instrument(skip(self), fields(partner_id = %partner_id, product_id = %product_id))]
    pub async fn get_partner_product_price(
        &self,
        partner_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<Decimal>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_partner_product_price"])
            .start_timer();

        let price: Option<Decimal> = sqlx::query_scalar(
            "SELECT price FROM partner_product_prices WHERE partner_id = $1 AND product_id = $2",
        )
        .bind(partner_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get partner price: {}", e))
        })?;

        timer.observe_duration();

        Ok(price)
    }

    /// Upsert a partner's override price for a product.
    #[instrument(skip(self), fields(partner_id = %partner_id, product_id = %product_id))]
    pub async fn set_partner_product_price(
        &self,
        partner_id: Uuid,
        product_id: Uuid,
        price: Decimal,
    ) -> Result<PartnerProductPrice, AppError> {
        self.require_active_partner(partner_id).await?;
        self.require_active_product_price(product_id).await?;

        let timer = DB_QUERY_DURATION
            .with_label_values(&["set_partner_product_price"])
            .start_timer();

        let row = sqlx::query_as::<_, PartnerProductPrice>(
            r#"
            INSERT INTO partner_product_prices (partner_id, product_id, price)
            VALUES ($1, $2, $3)
            ON CONFLICT (partner_id, product_id)
            DO UPDATE SET price = EXCLUDED.price, modified_utc = NOW()
            RETURNING partner_id, product_id, price, created_utc, modified_utc
            "#,
        )
        .bind(partner_id)
        .bind(product_id)
        .bind(price)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to set partner price: {}", e))
        })?;

        timer.observe_duration();

        info!(partner_id = %partner_id, product_id = %product_id, "Partner price set");

        Ok(row)
    }

    /// Remove a partner's override price for a product.
    #[instrument(skip(self), fields(partner_id = %partner_id, product_id = %product_id))]
    pub async fn delete_partner_product_price(
        &self,
        partner_id: Uuid,
        product_id: Uuid,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "DELETE FROM partner_product_prices WHERE partner_id = $1 AND product_id = $2",
        )
        .bind(partner_id)
        .bind(product_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to delete partner price: {}", e))
        })?;

        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // VAT Type Operations
    // -------------------------------------------------------------------------

    /// Create a VAT type.
    #[instrument(skip(self, input))]
    pub async fn create_vat_type(&self, input: &CreateVatType) -> Result<VatType, AppError> {
        let vat_type_id = Uuid::new_v4();
        let vat_type = sqlx::query_as::<_, VatType>(
            r#"
            INSERT INTO vat_types (vat_type_id, name, rate)
            VALUES ($1, $2, $3)
            RETURNING vat_type_id, name, rate, created_utc
            "#,
        )
        .bind(vat_type_id)
        .bind(&input.name)
        .bind(input.rate)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("VAT type '{}' already exists", input.name))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create VAT type: {}", e)),
        })?;

        info!(vat_type_id = %vat_type.vat_type_id, "VAT type created");

        Ok(vat_type)
    }

    /// Get a VAT type by ID.
    #[instrument(skip(self), fields(vat_type_id = %vat_type_id))]
    pub async fn get_vat_type(&self, vat_type_id: Uuid) -> Result<Option<VatType>, AppError> {
        let vat_type = sqlx::query_as::<_, VatType>(
            "SELECT vat_type_id, name, rate, created_utc FROM vat_types WHERE vat_type_id = $1",
        )
        .bind(vat_type_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get VAT type: {}", e)))?;

        Ok(vat_type)
    }

    /// List all VAT types.
    #[instrument(skip(self))]
    pub async fn list_vat_types(&self) -> Result<Vec<VatType>, AppError> {
        let vat_types = sqlx::query_as::<_, VatType>(
            "SELECT vat_type_id, name, rate, created_utc FROM vat_types ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list VAT types: {}", e)))?;

        Ok(vat_types)
    }

    /// Update a VAT type.
    #[instrument(skip(self, input), fields(vat_type_id = %vat_type_id))]
    pub async fn update_vat_type(
        &self,
        vat_type_id: Uuid,
        input: &UpdateVatType,
    ) -> Result<Option<VatType>, AppError> {
        let vat_type = sqlx::query_as::<_, VatType>(
            r#"
            UPDATE vat_types
            SET name = COALESCE($2, name),
                rate = COALESCE($3, rate)
            WHERE vat_type_id = $1
            RETURNING vat_type_id, name, rate, created_utc
            "#,
        )
        .bind(vat_type_id)
        .bind(&input.name)
        .bind(input.rate)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update VAT type: {}", e))
        })?;

        Ok(vat_type)
    }

    /// Delete a VAT type. Rejected while quote or order lines reference it.
    #[instrument(skip(self), fields(vat_type_id = %vat_type_id))]
    pub async fn delete_vat_type(&self, vat_type_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM vat_types WHERE vat_type_id = $1")
            .bind(vat_type_id)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                    AppError::Conflict(anyhow::anyhow!("VAT type is still in use"))
                }
                _ => AppError::DatabaseError(anyhow::anyhow!("Failed to delete VAT type: {}", e)),
            })?;

        Ok(result.rows_affected() > 0)
    }
}
