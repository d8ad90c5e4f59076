//! Quote models: header, line items, and per-line discount records.

use super::partner::default_page_size;
use crate::pricing::{AppliedDiscount, DiscountKind, LinePricing};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Quote lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    Draft,
    Sent,
    Accepted,
    Declined,
}

impl QuoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteStatus::Draft => "draft",
            QuoteStatus::Sent => "sent",
            QuoteStatus::Accepted => "accepted",
            QuoteStatus::Declined => "declined",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "sent" => QuoteStatus::Sent,
            "accepted" => QuoteStatus::Accepted,
            "declined" => QuoteStatus::Declined,
            _ => QuoteStatus::Draft,
        }
    }
}

/// Quote header. Totals are derived from the line items and the header
/// discount; they are recomputed inside the same transaction as any line
/// mutation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Quote {
    pub quote_id: Uuid,
    pub partner_id: Uuid,
    pub status: String,
    pub currency: String,
    /// Sum of gross line values (base price x quantity).
    pub item_total: Decimal,
    /// Sum of per-line discount amounts (always quantity-scaled).
    pub total_item_discounts: Decimal,
    pub discount_percentage: Option<Decimal>,
    pub discount_amount: Option<Decimal>,
    /// Floored at zero.
    pub total_amount: Decimal,
    pub valid_until: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_utc: DateTime<Utc>,
    pub modified_by: Option<Uuid>,
    pub modified_utc: Option<DateTime<Utc>>,
}

/// One product line on a quote. `unit_price` is the net discounted price;
/// `total_price` = quantity x net unit price.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuoteItem {
    pub quote_item_id: Uuid,
    pub quote_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub vat_type_id: Option<Uuid>,
    pub created_utc: DateTime<Utc>,
}

/// How a line's price was derived. One row per quote item, replaced whenever
/// the item's discount parameters change and removed with the item.
///
/// The `kind` tag determines which of the nullable columns are meaningful.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuoteItemDiscount {
    pub quote_item_id: Uuid,
    pub kind: String,
    pub base_price: Decimal,
    pub percentage: Option<Decimal>,
    pub amount: Option<Decimal>,
    pub partner_price: Option<Decimal>,
    pub tier_qty: Option<i32>,
    pub tier_price: Option<Decimal>,
    /// Discount attributable to the whole line (quantity-scaled).
    pub discount_amount: Decimal,
    pub clamped: bool,
}

impl QuoteItemDiscount {
    /// Flatten a pricing result into a storable discount row.
    pub fn from_pricing(quote_item_id: Uuid, pricing: &LinePricing) -> Self {
        let (percentage, amount, partner_price, tier_qty, tier_price) = match &pricing.applied {
            AppliedDiscount::None { .. } | AppliedDiscount::ListPrice { .. } => {
                (None, None, None, None, None)
            }
            AppliedDiscount::CustomPercentage { percentage, .. } => {
                (Some(*percentage), None, None, None, None)
            }
            AppliedDiscount::CustomAmount { amount, .. } => (None, Some(*amount), None, None, None),
            AppliedDiscount::PartnerPrice { partner_price, .. } => {
                (None, None, Some(*partner_price), None, None)
            }
            AppliedDiscount::VolumeTier {
                tier_qty,
                tier_price,
                ..
            } => (None, None, None, Some(*tier_qty), Some(*tier_price)),
        };

        Self {
            quote_item_id,
            kind: pricing.applied.kind_str().to_string(),
            base_price: pricing.applied.base_price(),
            percentage,
            amount,
            partner_price,
            tier_qty,
            tier_price,
            discount_amount: pricing.discount_amount,
            clamped: pricing.clamped,
        }
    }

}

/// Line item together with its discount record, as returned to callers.
#[derive(Debug, Clone, Serialize)]
pub struct QuoteItemWithDiscount {
    #[serde(flatten)]
    pub item: QuoteItem,
    pub discount: Option<QuoteItemDiscount>,
}

/// Full quote as returned to callers.
#[derive(Debug, Clone, Serialize)]
pub struct QuoteWithItems {
    #[serde(flatten)]
    pub quote: Quote,
    pub items: Vec<QuoteItemWithDiscount>,
}

/// Input for one line of a new quote.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuoteItem {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i32,
    #[serde(default = "default_discount_kind")]
    pub discount: DiscountKind,
    pub vat_type_id: Option<Uuid>,
}

fn default_discount_kind() -> DiscountKind {
    DiscountKind::None
}

/// Input for creating a quote with its lines in one unit of work.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuote {
    pub partner_id: Uuid,
    /// Defaults to the partner's currency when absent.
    pub currency: Option<String>,
    pub discount_percentage: Option<Decimal>,
    pub discount_amount: Option<Decimal>,
    pub valid_until: Option<NaiveDate>,
    pub notes: Option<String>,
    #[validate(nested)]
    pub items: Vec<CreateQuoteItem>,
}

/// Input for updating a draft quote header. The discount fields distinguish
/// "absent" (keep the stored value) from an explicit `null` (clear it).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateQuote {
    #[serde(default, deserialize_with = "present_or_null")]
    pub discount_percentage: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub discount_amount: Option<Option<Decimal>>,
    pub valid_until: Option<NaiveDate>,
    pub notes: Option<String>,
}

fn present_or_null<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuotesFilter {
    pub partner_id: Option<Uuid>,
    pub status: Option<QuoteStatus>,
    #[serde(default = "default_page_size")]
    pub page_size: i32,
    pub page_token: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn volume_tier_row_records_the_resolved_tier() {
        let pricing = LinePricing {
            net_unit_price: Decimal::from(900),
            discount_amount: Decimal::from(500),
            line_total: Decimal::from(4500),
            gross_total: Decimal::from(5000),
            applied: AppliedDiscount::VolumeTier {
                base_price: Decimal::from(1000),
                tier_qty: 5,
                tier_price: Decimal::from(900),
            },
            clamped: false,
        };

        let row = QuoteItemDiscount::from_pricing(Uuid::new_v4(), &pricing);
        assert_eq!(row.kind, "volume_tier");
        assert_eq!(row.base_price, Decimal::from(1000));
        assert_eq!(row.tier_qty, Some(5));
        assert_eq!(row.tier_price, Some(Decimal::from(900)));
        assert_eq!(row.percentage, None);
    }

    #[test]
    fn only_the_relevant_discount_columns_are_populated() {
        let pricing = LinePricing {
            net_unit_price: Decimal::from(900),
            discount_amount: Decimal::from(300),
            line_total: Decimal::from(2700),
            gross_total: Decimal::from(3000),
            applied: AppliedDiscount::CustomPercentage {
                base_price: Decimal::from(1000),
                percentage: Decimal::from(10),
            },
            clamped: false,
        };

        let row = QuoteItemDiscount::from_pricing(Uuid::new_v4(), &pricing);
        assert_eq!(row.percentage, Some(Decimal::from(10)));
        assert_eq!(row.amount, None);
        assert_eq!(row.partner_price, None);
        assert_eq!(row.tier_qty, None);
        assert_eq!(row.tier_price, None);
    }
}
