//! Order operations. An order and its items are written in one transaction;
//! the total is the sum of the line totals.

use super::Database;
use crate::context::UserContext;
use crate::models::{
    CreateOrder, ListOrdersFilter, Order, OrderItem, OrderStatus, OrderWithItems, QuoteStatus,
    UpdateOrder,
};
use crate::services::metrics::{DB_QUERY_DURATION, ORDERS_TOTAL};
use backoffice_core::error::AppError;
use rust_decimal::Decimal;
use tracing::{info, instrument};
use uuid::Uuid;

const ORDER_COLUMNS: &str = "order_id, partner_id, site_id, quote_id, status, currency, \
     total_amount, notes, created_by, created_utc, modified_by, modified_utc";

const ORDER_ITEM_COLUMNS: &str = "order_item_id, order_id, product_id, product_name, quantity, \
     unit_price, total_price, vat_type_id, created_utc";

impl Database {
    /// Create an order with its items in one unit of work.
    ///
    /// When a line carries no unit price the product's current sales price is
    /// used. A linked quote must belong to the same partner and be accepted.
    #[instrument(skip(self, input, ctx), fields(partner_id = %input.partner_id))]
    pub async fn create_order(
        &self,
        input: &CreateOrder,
        ctx: &UserContext,
    ) -> Result<OrderWithItems, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_order"])
            .start_timer();

        let partner = self.require_active_partner(input.partner_id).await?;
        let currency = input.currency.clone().unwrap_or(partner.currency);

        if let Some(site_id) = input.site_id {
            let site = self
                .get_site(site_id)
                .await?
                .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Site not found")))?;
            if site.partner_id != input.partner_id {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Site belongs to a different partner"
                )));
            }
        }

        if let Some(quote_id) = input.quote_id {
            let quote = self
                .get_quote(quote_id)
                .await?
                .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Quote not found")))?;
            if quote.partner_id != input.partner_id {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Quote belongs to a different partner"
                )));
            }
            if quote.status != QuoteStatus::Accepted.as_str() {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Only accepted quotes can be turned into orders"
                )));
            }
        }

        // Resolve every line before the first insert.
        let mut lines = Vec::with_capacity(input.items.len());
        let mut total_amount = Decimal::ZERO;
        for item in &input.items {
            let price = self.require_active_product_price(item.product_id).await?;
            if let Some(vat_type_id) = item.vat_type_id {
                self.get_vat_type(vat_type_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("VAT type not found")))?;
            }
            let unit_price = item.unit_price.unwrap_or(price.sales_price);
            if unit_price < Decimal::ZERO {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Unit price must not be negative"
                )));
            }
            let total_price = unit_price * Decimal::from(item.quantity);
            total_amount += total_price;
            lines.push((price.name, unit_price, total_price));
        }

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let order_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO orders (
                order_id, partner_id, site_id, quote_id, status, currency,
                total_amount, notes, created_by
            )
            VALUES ($1, $2, $3, $4, 'new', $5, $6, $7, $8)
            "#,
        )
        .bind(order_id)
        .bind(input.partner_id)
        .bind(input.site_id)
        .bind(input.quote_id)
        .bind(&currency)
        .bind(total_amount)
        .bind(&input.notes)
        .bind(ctx.user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to insert order: {}", e)))?;

        for (item, (product_name, unit_price, total_price)) in
            input.items.iter().zip(lines.iter())
        {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    order_item_id, order_id, product_id, product_name, quantity,
                    unit_price, total_price, vat_type_id
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(order_id)
            .bind(item.product_id)
            .bind(product_name)
            .bind(item.quantity)
            .bind(unit_price)
            .bind(total_price)
            .bind(item.vat_type_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to insert order item: {}", e))
            })?;
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit order: {}", e))
        })?;

        timer.observe_duration();

        ORDERS_TOTAL.with_label_values(&["new"]).inc();
        info!(order_id = %order_id, items = input.items.len(), "Order created");

        self.get_order_with_items(order_id)
            .await?
            .ok_or_else(|| AppError::InternalError(anyhow::anyhow!("Order vanished after create")))
    }

    /// Get an order header by ID.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<Option<Order>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_order"])
            .start_timer();

        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = $1"
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get order: {}", e)))?;

        timer.observe_duration();

        Ok(order)
    }

    /// Get an order with its items.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order_with_items(
        &self,
        order_id: Uuid,
    ) -> Result<Option<OrderWithItems>, AppError> {
        let Some(order) = self.get_order(order_id).await? else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ORDER_ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY created_utc, order_item_id"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get order items: {}", e)))?;

        Ok(Some(OrderWithItems { order, items }))
    }

    /// List orders.
    #[instrument(skip(self, filter))]
    pub async fn list_orders(&self, filter: &ListOrdersFilter) -> Result<Vec<Order>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_orders"])
            .start_timer();

        let limit = filter.page_size.clamp(1, 100) as i64;
        let status = filter.status.map(|s| s.as_str().to_string());

        let orders = if let Some(cursor) = filter.page_token {
            sqlx::query_as::<_, Order>(&format!(
                r#"
                SELECT {ORDER_COLUMNS}
                FROM orders
                WHERE ($1::uuid IS NULL OR partner_id = $1)
                  AND ($2::varchar IS NULL OR status = $2)
                  AND order_id > $3
                ORDER BY order_id
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
            sqlx::query_as::<_, Order>(&format!(
                r#"
                SELECT {ORDER_COLUMNS}
                FROM orders
                WHERE ($1::uuid IS NULL OR partner_id = $1)
                  AND ($2::varchar IS NULL OR status = $2)
                ORDER BY order_id
                LIMIT $3
                "#
            ))
            .bind(filter.partner_id)
            .bind(&status)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        }
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list orders: {}", e)))?;

        timer.observe_duration();

        Ok(orders)
    }

    /// Update an order. A status change must follow the allowed transitions.
    #[instrument(skip(self, input, ctx), fields(order_id = %order_id))]
    pub async fn update_order(
        &self,
        order_id: Uuid,
        input: &UpdateOrder,
        ctx: &UserContext,
    ) -> Result<Option<Order>, AppError> {
        let order = match self.get_order(order_id).await? {
            Some(o) => o,
            None => return Ok(None),
        };

        if let Some(next) = input.status {
            let current = OrderStatus::from_string(&order.status);
            if !current.can_transition_to(next) {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Cannot move order from {} to {}",
                    current.as_str(),
                    next.as_str()
                )));
            }
        }

        if let Some(site_id) = input.site_id {
            let site = self
                .get_site(site_id)
                .await?
                .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Site not found")))?;
            if site.partner_id != order.partner_id {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Site belongs to a different partner"
                )));
            }
        }

        let status = input.status.map(|s| s.as_str().to_string());
        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            UPDATE orders
            SET site_id = COALESCE($2, site_id),
                notes = COALESCE($3, notes),
                status = COALESCE($4, status),
                modified_by = $5,
                modified_utc = NOW()
            WHERE order_id = $1
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order_id)
        .bind(input.site_id)
        .bind(&input.notes)
        .bind(&status)
        .bind(ctx.user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update order: {}", e)))?;

        if let (Some(ref o), Some(next)) = (&order, input.status) {
            ORDERS_TOTAL.with_label_values(&[next.as_str()]).inc();
            info!(order_id = %o.order_id, status = next.as_str(), "Order status changed");
        }

        Ok(order)
    }

    /// Cancel an order from any non-terminal state.
    #[instrument(skip(self, ctx), fields(order_id = %order_id))]
    pub async fn cancel_order(
        &self,
        order_id: Uuid,
        ctx: &UserContext,
    ) -> Result<Option<Order>, AppError> {
        self.update_order(
            order_id,
            &UpdateOrder {
                status: Some(OrderStatus::Cancelled),
                ..Default::default()
            },
            ctx,
        )
        .await
    }
}
