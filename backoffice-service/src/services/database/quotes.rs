//! Quote operations.
//!
//! A quote, its line items, and their discount rows are written under one
//! transaction; every line is validated and priced before the first insert,
//! so a bad line rejects the whole request with nothing persisted. Header
//! totals are recomputed inside the same transaction as any line mutation.

use super::Database;
use crate::context::UserContext;
use crate::models::{
    CreateQuote, CreateQuoteItem, ListQuotesFilter, Quote, QuoteItem, QuoteItemDiscount,
    QuoteItemWithDiscount, QuoteStatus, QuoteWithItems, UpdateQuote,
};
use crate::pricing::{price_line, quote_totals, HeaderDiscount, LinePricing};
use crate::services::metrics::{DB_QUERY_DURATION, PRICE_CLAMPS_TOTAL, QUOTES_TOTAL};
use backoffice_core::error::AppError;
use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};
use tracing::{info, instrument};
use uuid::Uuid;

const QUOTE_COLUMNS: &str = "quote_id, partner_id, status, currency, item_total, \
     total_item_discounts, discount_percentage, discount_amount, total_amount, valid_until, \
     notes, created_by, created_utc, modified_by, modified_utc";

const QUOTE_ITEM_COLUMNS: &str = "quote_item_id, quote_id, product_id, product_name, quantity, \
     unit_price, total_price, vat_type_id, created_utc";

const DISCOUNT_COLUMNS: &str = "quote_item_id, kind, base_price, percentage, amount, \
     partner_price, tier_qty, tier_price, discount_amount, clamped";

impl Database {
    /// Validate references for one requested line and price it.
    ///
    /// The partner override price is only consulted for the partner-price
    /// kind; reference data is looked up at calculation time, never cached.
    async fn price_quote_line(
        &self,
        partner_id: Uuid,
        item: &CreateQuoteItem,
    ) -> Result<(String, LinePricing), AppError> {
        let price = self.require_active_product_price(item.product_id).await?;

        if let Some(vat_type_id) = item.vat_type_id {
            self.get_vat_type(vat_type_id)
                .await?
                .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("VAT type not found")))?;
        }

        let partner_price = if matches!(item.discount, crate::pricing::DiscountKind::PartnerPrice)
        {
            self.get_partner_product_price(partner_id, item.product_id)
                .await?
        } else {
            None
        };

        let pricing = price_line(&price, partner_price, item.quantity, &item.discount)?;
        if pricing.clamped {
            PRICE_CLAMPS_TOTAL
                .with_label_values(&[pricing.applied.kind_str()])
                .inc();
        }

        Ok((price.name, pricing))
    }

    /// Insert one priced line and its discount row.
    async fn insert_quote_item(
        tx: &mut Transaction<'_, Postgres>,
        quote_id: Uuid,
        item: &CreateQuoteItem,
        product_name: &str,
        pricing: &LinePricing,
    ) -> Result<QuoteItem, AppError> {
        let quote_item_id = Uuid::new_v4();
        let inserted = sqlx::query_as::<_, QuoteItem>(&format!(
            r#"
            INSERT INTO quote_items (
                quote_item_id, quote_id, product_id, product_name, quantity,
                unit_price, total_price, vat_type_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {QUOTE_ITEM_COLUMNS}
            "#
        ))
        .bind(quote_item_id)
        .bind(quote_id)
        .bind(item.product_id)
        .bind(product_name)
        .bind(item.quantity)
        .bind(pricing.net_unit_price)
        .bind(pricing.line_total)
        .bind(item.vat_type_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to insert quote item: {}", e))
        })?;

        let discount = QuoteItemDiscount::from_pricing(quote_item_id, pricing);
        sqlx::query(&format!(
            r#"
            INSERT INTO quote_item_discounts ({DISCOUNT_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#
        ))
        .bind(discount.quote_item_id)
        .bind(&discount.kind)
        .bind(discount.base_price)
        .bind(discount.percentage)
        .bind(discount.amount)
        .bind(discount.partner_price)
        .bind(discount.tier_qty)
        .bind(discount.tier_price)
        .bind(discount.discount_amount)
        .bind(discount.clamped)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to insert quote item discount: {}", e))
        })?;

        Ok(inserted)
    }

    /// Recompute and persist the quote's derived totals from its stored
    /// lines and header discount. Runs inside the caller's transaction.
    async fn recompute_quote_totals(
        tx: &mut Transaction<'_, Postgres>,
        quote_id: Uuid,
        header: HeaderDiscount,
    ) -> Result<(), AppError> {
        let lines: Vec<(Decimal, Decimal)> = sqlx::query_as(
            r#"
            SELECT d.base_price * i.quantity, d.discount_amount
            FROM quote_items i
            JOIN quote_item_discounts d ON d.quote_item_id = i.quote_item_id
            WHERE i.quote_id = $1
            "#,
        )
        .bind(quote_id)
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to load quote lines: {}", e))
        })?;

        let totals = quote_totals(lines, header);

        sqlx::query(
            r#"
            UPDATE quotes
            SET item_total = $2,
                total_item_discounts = $3,
                total_amount = $4
            WHERE quote_id = $1
            "#,
        )
        .bind(quote_id)
        .bind(totals.item_total)
        .bind(totals.total_item_discounts)
        .bind(totals.total_amount)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update quote totals: {}", e))
        })?;

        Ok(())
    }

    fn header_of(quote: &Quote) -> Result<HeaderDiscount, AppError> {
        HeaderDiscount::resolve(quote.discount_percentage, quote.discount_amount)
    }

    /// Fetch a quote and reject mutation unless it is still a draft.
    async fn require_draft_quote(&self, quote_id: Uuid) -> Result<Quote, AppError> {
        let quote = self
            .get_quote(quote_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Quote not found")))?;
        if quote.status != QuoteStatus::Draft.as_str() {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Only draft quotes can be modified"
            )));
        }
        Ok(quote)
    }

    /// Create a quote with its lines in one unit of work.
    #[instrument(skip(self, input, ctx), fields(partner_id = %input.partner_id))]
    pub async fn create_quote(
        &self,
        input: &CreateQuote,
        ctx: &UserContext,
    ) -> Result<QuoteWithItems, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_quote"])
            .start_timer();

        let partner = self.require_active_partner(input.partner_id).await?;
        let currency = input.currency.clone().unwrap_or(partner.currency);
        let header = HeaderDiscount::resolve(input.discount_percentage, input.discount_amount)?;

        // Validate and price every line before the first insert.
        let mut priced = Vec::with_capacity(input.items.len());
        for item in &input.items {
            priced.push(self.price_quote_line(input.partner_id, item).await?);
        }

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let quote_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO quotes (
                quote_id, partner_id, status, currency, discount_percentage,
                discount_amount, valid_until, notes, created_by
            )
            VALUES ($1, $2, 'draft', $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(quote_id)
        .bind(input.partner_id)
        .bind(&currency)
        .bind(input.discount_percentage)
        .bind(input.discount_amount)
        .bind(input.valid_until)
        .bind(&input.notes)
        .bind(ctx.user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to insert quote: {}", e)))?;

        for (item, (product_name, pricing)) in input.items.iter().zip(priced.iter()) {
            Self::insert_quote_item(&mut tx, quote_id, item, product_name, pricing).await?;
        }

        Self::recompute_quote_totals(&mut tx, quote_id, header).await?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit quote: {}", e))
        })?;

        timer.observe_duration();

        QUOTES_TOTAL.with_label_values(&["draft"]).inc();
        info!(quote_id = %quote_id, items = input.items.len(), "Quote created");

        self.get_quote_with_items(quote_id)
            .await?
            .ok_or_else(|| AppError::InternalError(anyhow::anyhow!("Quote vanished after create")))
    }

    /// Get a quote header by ID.
    #[instrument(skip(self), fields(quote_id = %quote_id))]
    pub async fn get_quote(&self, quote_id: Uuid) -> Result<Option<Quote>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_quote"])
            .start_timer();

        let quote = sqlx::query_as::<_, Quote>(&format!(
            "SELECT {QUOTE_COLUMNS} FROM quotes WHERE quote_id = $1"
        ))
        .bind(quote_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get quote: {}", e)))?;

        timer.observe_duration();

        Ok(quote)
    }

    /// Get a quote with its lines and their discount records.
    #[instrument(skip(self), fields(quote_id = %quote_id))]
    pub async fn get_quote_with_items(
        &self,
        quote_id: Uuid,
    ) -> Result<Option<QuoteWithItems>, AppError> {
        let Some(quote) = self.get_quote(quote_id).await? else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, QuoteItem>(&format!(
            "SELECT {QUOTE_ITEM_COLUMNS} FROM quote_items WHERE quote_id = $1 ORDER BY created_utc, quote_item_id"
        ))
        .bind(quote_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get quote items: {}", e)))?;

        let discounts = sqlx::query_as::<_, QuoteItemDiscount>(&format!(
            r#"
            SELECT {DISCOUNT_COLUMNS}
            FROM quote_item_discounts
            WHERE quote_item_id IN (SELECT quote_item_id FROM quote_items WHERE quote_id = $1)
            "#
        ))
        .bind(quote_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get quote discounts: {}", e))
        })?;

        let items = items
            .into_iter()
            .map(|item| {
                let discount = discounts
                    .iter()
                    .find(|d| d.quote_item_id == item.quote_item_id)
                    .cloned();
                QuoteItemWithDiscount { item, discount }
            })
            .collect();

        Ok(Some(QuoteWithItems { quote, items }))
    }

    /// List quotes.
    #[instrument(skip(self, filter))]
    pub async fn list_quotes(&self, filter: &ListQuotesFilter) -> Result<Vec<Quote>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_quotes"])
            .start_timer();

        let limit = filter.page_size.clamp(1, 100) as i64;
        let status = filter.status.map(|s| s.as_str().to_string());

        let quotes = if let Some(cursor) = filter.page_token {
            sqlx::query_as::<_, Quote>(&format!(
                r#"
                SELECT {QUOTE_COLUMNS}
                FROM quotes
                WHERE ($1::uuid IS NULL OR partner_id = $1)
                  AND ($2::varchar IS NULL OR status = $2)
                  AND quote_id > $3
                ORDER BY quote_id
                LIMIT $4
                "#
            ))
            .bind(filter.partner_id)
            .bind(&status)
            .bind(cursor)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, Quote>(&format!(
                r#"
                SELECT {QUOTE_COLUMNS}
                FROM quotes
                WHERE ($1::uuid IS NULL OR partner_id = $1)
                  AND ($2::varchar IS NULL OR status = $2)
                ORDER BY quote_id
                LIMIT $3
                "#
            ))
            .bind(filter.partner_id)
            .bind(&status)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        }
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list quotes: {}", e)))?;

        timer.observe_duration();

        Ok(quotes)
    }

    /// Update a draft quote's header and recompute totals.
    #[instrument(skip(self, input, ctx), fields(quote_id = %quote_id))]
    pub async fn update_quote(
        &self,
        quote_id: Uuid,
        input: &UpdateQuote,
        ctx: &UserContext,
    ) -> Result<Option<QuoteWithItems>, AppError> {
        let quote = match self.get_quote(quote_id).await? {
            Some(q) => q,
            None => return Ok(None),
        };
        if quote.status != QuoteStatus::Draft.as_str() {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Only draft quotes can be updated"
            )));
        }

        // An absent field keeps the stored discount; an explicit null clears it.
        let discount_percentage = input.discount_percentage.unwrap_or(quote.discount_percentage);
        let discount_amount = input.discount_amount.unwrap_or(quote.discount_amount);
        let header = HeaderDiscount::resolve(discount_percentage, discount_amount)?;

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        sqlx::query(
            r#"
            UPDATE quotes
            SET discount_percentage = $2,
                discount_amount = $3,
                valid_until = COALESCE($4, valid_until),
                notes = COALESCE($5, notes),
                modified_by = $6,
                modified_utc = NOW()
            WHERE quote_id = $1
            "#,
        )
        .bind(quote_id)
        .bind(discount_percentage)
        .bind(discount_amount)
        .bind(input.valid_until)
        .bind(&input.notes)
        .bind(ctx.user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update quote: {}", e)))?;

        Self::recompute_quote_totals(&mut tx, quote_id, header).await?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit quote update: {}", e))
        })?;

        self.get_quote_with_items(quote_id).await
    }

    /// Add a line to a draft quote.
    #[instrument(skip(self, item), fields(quote_id = %quote_id))]
    pub async fn add_quote_item(
        &self,
        quote_id: Uuid,
        item: &CreateQuoteItem,
    ) -> Result<QuoteWithItems, AppError> {
        let quote = self.require_draft_quote(quote_id).await?;
        let (product_name, pricing) = self.price_quote_line(quote.partner_id, item).await?;
        let header = Self::header_of(&quote)?;

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        Self::insert_quote_item(&mut tx, quote_id, item, &product_name, &pricing).await?;
        Self::recompute_quote_totals(&mut tx, quote_id, header).await?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit line add: {}", e))
        })?;

        info!(quote_id = %quote_id, "Quote line added");

        self.get_quote_with_items(quote_id)
            .await?
            .ok_or_else(|| AppError::InternalError(anyhow::anyhow!("Quote vanished after add")))
    }

    /// Replace a line on a draft quote: the item is re-priced and its
    /// discount record is replaced, then totals are recomputed.
    #[instrument(skip(self, item), fields(quote_id = %quote_id, quote_item_id = %quote_item_id))]
    pub async fn update_quote_item(
        &self,
        quote_id: Uuid,
        quote_item_id: Uuid,
        item: &CreateQuoteItem,
    ) -> Result<QuoteWithItems, AppError> {
        let quote = self.require_draft_quote(quote_id).await?;
        let (product_name, pricing) = self.price_quote_line(quote.partner_id, item).await?;
        let header = Self::header_of(&quote)?;

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let result = sqlx::query(
            r#"
            UPDATE quote_items
            SET product_id = $3,
                product_name = $4,
                quantity = $5,
                unit_price = $6,
                total_price = $7,
                vat_type_id = $8
            WHERE quote_id = $1 AND quote_item_id = $2
            "#,
        )
        .bind(quote_id)
        .bind(quote_item_id)
        .bind(item.product_id)
        .bind(&product_name)
        .bind(item.quantity)
        .bind(pricing.net_unit_price)
        .bind(pricing.line_total)
        .bind(item.vat_type_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update quote item: {}", e))
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("Quote item not found")));
        }

        // Replace the discount record.
        sqlx::query("DELETE FROM quote_item_discounts WHERE quote_item_id = $1")
            .bind(quote_item_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to replace discount: {}", e))
            })?;

        let discount = QuoteItemDiscount::from_pricing(quote_item_id, &pricing);
        sqlx::query(&format!(
            r#"
            INSERT INTO quote_item_discounts ({DISCOUNT_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#
        ))
        .bind(discount.quote_item_id)
        .bind(&discount.kind)
        .bind(discount.base_price)
        .bind(discount.percentage)
        .bind(discount.amount)
        .bind(discount.partner_price)
        .bind(discount.tier_qty)
        .bind(discount.tier_price)
        .bind(discount.discount_amount)
        .bind(discount.clamped)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to insert discount: {}", e))
        })?;

        Self::recompute_quote_totals(&mut tx, quote_id, header).await?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit line update: {}", e))
        })?;

        self.get_quote_with_items(quote_id)
            .await?
            .ok_or_else(|| AppError::InternalError(anyhow::anyhow!("Quote vanished after update")))
    }

    /// Remove a line from a draft quote. The discount row goes with it.
    #[instrument(skip(self), fields(quote_id = %quote_id, quote_item_id = %quote_item_id))]
    pub async fn remove_quote_item(
        &self,
        quote_id: Uuid,
        quote_item_id: Uuid,
    ) -> Result<QuoteWithItems, AppError> {
        let quote = self.require_draft_quote(quote_id).await?;
        let header = Self::header_of(&quote)?;

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let result =
            sqlx::query("DELETE FROM quote_items WHERE quote_id = $1 AND quote_item_id = $2")
                .bind(quote_id)
                .bind(quote_item_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to remove quote item: {}", e))
                })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("Quote item not found")));
        }

        Self::recompute_quote_totals(&mut tx, quote_id, header).await?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit line removal: {}", e))
        })?;

        info!(quote_id = %quote_id, "Quote line removed");

        self.get_quote_with_items(quote_id)
            .await?
            .ok_or_else(|| AppError::InternalError(anyhow::anyhow!("Quote vanished after removal")))
    }

    /// Move a quote through its lifecycle: draft -> sent -> accepted/declined.
    #[instrument(skip(self, ctx), fields(quote_id = %quote_id))]
    pub async fn set_quote_status(
        &self,
        quote_id: Uuid,
        next: QuoteStatus,
        ctx: &UserContext,
    ) -> Result<Option<Quote>, AppError> {
        let quote = match self.get_quote(quote_id).await? {
            Some(q) => q,
            None => return Ok(None),
        };

        let current = QuoteStatus::from_string(&quote.status);
        let allowed = matches!(
            (current, next),
            (QuoteStatus::Draft, QuoteStatus::Sent)
                | (QuoteStatus::Sent, QuoteStatus::Accepted)
                | (QuoteStatus::Sent, QuoteStatus::Declined)
        );
        if !allowed {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Cannot move quote from {} to {}",
                current.as_str(),
                next.as_str()
            )));
        }

        let quote = sqlx::query_as::<_, Quote>(&format!(
            r#"
            UPDATE quotes
            SET status = $2,
                modified_by = $3,
                modified_utc = NOW()
            WHERE quote_id = $1
            RETURNING {QUOTE_COLUMNS}
            "#
        ))
        .bind(quote_id)
        .bind(next.as_str())
        .bind(ctx.user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update quote status: {}", e))
        })?;

        if let Some(ref q) = quote {
            QUOTES_TOTAL.with_label_values(&[next.as_str()]).inc();
            info!(quote_id = %q.quote_id, status = next.as_str(), "Quote status changed");
        }

        Ok(quote)
    }

    /// Delete a draft quote. Lines and discount rows cascade.
    #[instrument(skip(self), fields(quote_id = %quote_id))]
    pub async fn delete_quote(&self, quote_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM quotes WHERE quote_id = $1 AND status = 'draft'")
            .bind(quote_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete quote: {}", e))
            })?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(quote_id = %quote_id, "Draft quote deleted");
        }

        Ok(deleted)
    }
}
