//! Product price models: base sales price, volume tiers, and per-partner
//! override prices.

use super::partner::default_page_size;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Per-product base sales price plus up to three volume tiers.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProductPrice {
    pub product_id: Uuid,
    pub name: String,
    pub sales_price: Decimal,
    pub currency: String,
    pub tier1_qty: Option<i32>,
    pub tier1_price: Option<Decimal>,
    pub tier2_qty: Option<i32>,
    pub tier2_price: Option<Decimal>,
    pub tier3_qty: Option<i32>,
    pub tier3_price: Option<Decimal>,
    pub active: bool,
    pub created_utc: DateTime<Utc>,
    pub modified_utc: Option<DateTime<Utc>>,
}

impl ProductPrice {
    /// Configured volume tiers as (threshold, price) pairs, highest
    /// threshold first. Tiers with a missing price are ignored.
    pub fn volume_tiers(&self) -> Vec<(i32, Decimal)> {
        let mut tiers: Vec<(i32, Decimal)> = [
            (self.tier1_qty, self.tier1_price),
            (self.tier2_qty, self.tier2_price),
            (self.tier3_qty, self.tier3_price),
        ]
        .into_iter()
        .filter_map(|(qty, price)| match (qty, price) {
            (Some(q), Some(p)) => Some((q, p)),
            _ => None,
        })
        .collect();
        tiers.sort_by(|a, b| b.0.cmp(&a.0));
        tiers
    }
}

/// Per-partner override price for one product.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PartnerProductPrice {
    pub partner_id: Uuid,
    pub product_id: Uuid,
    pub price: Decimal,
    pub created_utc: DateTime<Utc>,
    pub modified_utc: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProductPrice {
    #[validate(length(min = 1, message = "Product name cannot be empty"))]
    pub name: String,
    pub sales_price: Decimal,
    #[validate(length(equal = 3, message = "Currency must be a 3-letter code"))]
    pub currency: String,
    pub tier1_qty: Option<i32>,
    pub tier1_price: Option<Decimal>,
    pub tier2_qty: Option<i32>,
    pub tier2_price: Option<Decimal>,
    pub tier3_qty: Option<i32>,
    pub tier3_price: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProductPrice {
    #[validate(length(min = 1, message = "Product name cannot be empty"))]
    pub name: Option<String>,
    pub sales_price: Option<Decimal>,
    pub tier1_qty: Option<i32>,
    pub tier1_price: Option<Decimal>,
    pub tier2_qty: Option<i32>,
    pub tier2_price: Option<Decimal>,
    pub tier3_qty: Option<i32>,
    pub tier3_price: Option<Decimal>,
    pub active: Option<bool>,
}

/// Input for upserting a partner's override price.
#[derive(Debug, Clone, Deserialize)]
pub struct SetPartnerProductPrice {
    pub price: Decimal,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListProductPricesFilter {
    pub search: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
    #[serde(default = "default_page_size")]
    pub page_size: i32,
    pub page_token: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_tiers_are_sorted_descending() {
        let price = ProductPrice {
            product_id: Uuid::new_v4(),
            name: "Widget".to_string(),
            sales_price: Decimal::from(1000),
            currency: "EUR".to_string(),
            tier1_qty: Some(5),
            tier1_price: Some(Decimal::from(900)),
            tier2_qty: Some(10),
            tier2_price: Some(Decimal::from(850)),
            tier3_qty: Some(3),
            tier3_price: Some(Decimal::from(950)),
            active: true,
            created_utc: Utc::now(),
            modified_utc: None,
        };
        let tiers = price.volume_tiers();
        assert_eq!(
            tiers,
            vec![
                (10, Decimal::from(850)),
                (5, Decimal::from(900)),
                (3, Decimal::from(950)),
            ]
        );
    }

    #[test]
    fn incomplete_tiers_are_ignored() {
        let price = ProductPrice {
            product_id: Uuid::new_v4(),
            name: "Widget".to_string(),
            sales_price: Decimal::from(1000),
            currency: "EUR".to_string(),
            tier1_qty: Some(5),
            tier1_price: None,
            tier2_qty: None,
            tier2_price: Some(Decimal::from(850)),
            tier3_qty: None,
            tier3_price: None,
            active: true,
            created_utc: Utc::now(),
            modified_utc: None,
        };
        assert!(price.volume_tiers().is_empty());
    }
}
