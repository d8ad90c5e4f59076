//! Order models. An order and its items are written in one transaction.

use super::partner::default_page_size;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    New,
    Confirmed,
    Shipped,
    Closed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "new",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Closed => "closed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "confirmed" => OrderStatus::Confirmed,
            "shipped" => OrderStatus::Shipped,
            "closed" => OrderStatus::Closed,
            "cancelled" => OrderStatus::Cancelled,
            _ => OrderStatus::New,
        }
    }

    /// Allowed forward transitions. Cancel is allowed from any non-terminal
    /// state.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (New, Confirmed)
                | (Confirmed, Shipped)
                | (Shipped, Closed)
                | (New, Cancelled)
                | (Confirmed, Cancelled)
                | (Shipped, Cancelled)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub order_id: Uuid,
    pub partner_id: Uuid,
    pub site_id: Option<Uuid>,
    /// Source quote, when the order was raised from an accepted quote.
    pub quote_id: Option<Uuid>,
    pub status: String,
    pub currency: String,
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_utc: DateTime<Utc>,
    pub modified_by: Option<Uuid>,
    pub modified_utc: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderItem {
    pub order_item_id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub vat_type_id: Option<Uuid>,
    pub created_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOrderItem {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i32,
    /// Agreed unit price; defaults to the product's current sales price.
    pub unit_price: Option<Decimal>,
    pub vat_type_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOrder {
    pub partner_id: Uuid,
    pub site_id: Option<Uuid>,
    pub quote_id: Option<Uuid>,
    pub currency: Option<String>,
    pub notes: Option<String>,
    #[validate(length(min = 1, message = "An order needs at least one item"))]
    #[validate(nested)]
    pub items: Vec<CreateOrderItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateOrder {
    pub site_id: Option<Uuid>,
    pub notes: Option<String>,
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListOrdersFilter {
    pub partner_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
    #[serde(default = "default_page_size")]
    pub page_size: i32,
    pub page_token: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_transitions() {
        assert!(OrderStatus::New.can_transition_to(OrderStatus::Confirmed));
        assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Closed.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::New.can_transition_to(OrderStatus::Shipped));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Confirmed));
    }
}
