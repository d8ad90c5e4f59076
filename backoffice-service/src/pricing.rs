//! Quote line-item pricing.
//!
//! Pure calculation: given a product's base price (plus volume tiers), an
//! optional partner override price, a quantity, and a requested discount
//! kind, compute the net unit price, the per-line discount amount, and the
//! line total. Nothing here touches the database; reference data is resolved
//! by the caller and passed in.
//!
//! Convention: `discount_amount` is always the full per-line amount
//! (quantity-scaled), never per-unit.

use crate::models::ProductPrice;
use backoffice_core::error::AppError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Requested discount method for a quote line.
///
/// Each variant carries only the parameters relevant to it. The partner-price
/// and volume-tier kinds derive their price from reference data instead of
/// accepting one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiscountKind {
    None,
    ListPrice,
    CustomPercentage { percentage: Decimal },
    CustomAmount { amount: Decimal },
    PartnerPrice,
    VolumeTier,
}

impl DiscountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountKind::None => "none",
            DiscountKind::ListPrice => "list_price",
            DiscountKind::CustomPercentage { .. } => "custom_percentage",
            DiscountKind::CustomAmount { .. } => "custom_amount",
            DiscountKind::PartnerPrice => "partner_price",
            DiscountKind::VolumeTier => "volume_tier",
        }
    }
}

/// The discount that was actually applied, with its resolved parameters.
///
/// Meaningful for the derived kinds: a partner-price request with no override
/// on file and a volume-tier request below every threshold both resolve to
/// `ListPrice`, and that is what gets recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AppliedDiscount {
    None {
        base_price: Decimal,
    },
    ListPrice {
        base_price: Decimal,
    },
    CustomPercentage {
        base_price: Decimal,
        percentage: Decimal,
    },
    CustomAmount {
        base_price: Decimal,
        amount: Decimal,
    },
    PartnerPrice {
        base_price: Decimal,
        partner_price: Decimal,
    },
    VolumeTier {
        base_price: Decimal,
        tier_qty: i32,
        tier_price: Decimal,
    },
}

impl AppliedDiscount {
    pub fn kind_str(&self) -> &'static str {
        match self {
            AppliedDiscount::None { .. } => "none",
            AppliedDiscount::ListPrice { .. } => "list_price",
            AppliedDiscount::CustomPercentage { .. } => "custom_percentage",
            AppliedDiscount::CustomAmount { .. } => "custom_amount",
            AppliedDiscount::PartnerPrice { .. } => "partner_price",
            AppliedDiscount::VolumeTier { .. } => "volume_tier",
        }
    }

    pub fn base_price(&self) -> Decimal {
        match self {
            AppliedDiscount::None { base_price }
            | AppliedDiscount::ListPrice { base_price }
            | AppliedDiscount::CustomPercentage { base_price, .. }
            | AppliedDiscount::CustomAmount { base_price, .. }
            | AppliedDiscount::PartnerPrice { base_price, .. }
            | AppliedDiscount::VolumeTier { base_price, .. } => *base_price,
        }
    }
}

/// Result of pricing a single quote line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinePricing {
    /// Net unit price after the discount, clamped at zero.
    pub net_unit_price: Decimal,
    /// Discount attributable to the whole line (quantity-scaled).
    pub discount_amount: Decimal,
    /// `net_unit_price * quantity`.
    pub line_total: Decimal,
    /// Gross line value before any discount (`base_price * quantity`).
    pub gross_total: Decimal,
    /// What actually applied, with resolved parameters, for audit.
    pub applied: AppliedDiscount,
    /// Set when the net price had to be clamped to zero.
    pub clamped: bool,
}

impl LinePricing {
    /// The (gross total, discount amount) pair [`quote_totals`] folds over.
    pub fn totals_pair(&self) -> (Decimal, Decimal) {
        (self.gross_total, self.discount_amount)
    }
}

/// Header-level discount on a quote.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeaderDiscount {
    None,
    Percentage(Decimal),
    Amount(Decimal),
}

impl HeaderDiscount {
    /// Resolve the mutually exclusive percentage/amount pair. Percentage
    /// takes precedence when both are supplied; the conflict is logged.
    pub fn resolve(
        percentage: Option<Decimal>,
        amount: Option<Decimal>,
    ) -> Result<Self, AppError> {
        if let Some(pct) = percentage {
            if pct < Decimal::ZERO || pct > Decimal::ONE_HUNDRED {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Header discount percentage {} outside [0, 100]",
                    pct
                )));
            }
            if amount.is_some() {
                tracing::warn!(
                    percentage = %pct,
                    "Both header discount percentage and amount supplied; percentage takes precedence"
                );
            }
            return Ok(HeaderDiscount::Percentage(pct));
        }
        if let Some(amt) = amount {
            if amt < Decimal::ZERO {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Header discount amount {} is negative",
                    amt
                )));
            }
            return Ok(HeaderDiscount::Amount(amt));
        }
        Ok(HeaderDiscount::None)
    }
}

/// Aggregated totals for a quote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteTotals {
    /// Sum of gross line values (base price x quantity).
    pub item_total: Decimal,
    /// Sum of per-line discount amounts.
    pub total_item_discounts: Decimal,
    /// Net of item discounts and the header discount, floored at zero.
    pub total_amount: Decimal,
}

/// Price one line.
///
/// `partner_price` is the per-partner override, if one is on file; it is only
/// consulted for [`DiscountKind::PartnerPrice`].
pub fn price_line(
    price: &ProductPrice,
    partner_price: Option<Decimal>,
    quantity: i32,
    kind: &DiscountKind,
) -> Result<LinePricing, AppError> {
    if quantity <= 0 {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Quantity must be positive, got {}",
            quantity
        )));
    }

    let base = price.sales_price;
    let qty = Decimal::from(quantity);
    let gross_total = base * qty;

    let (net_unit_price, discount_amount, applied) = match kind {
        DiscountKind::None => (base, Decimal::ZERO, AppliedDiscount::None { base_price: base }),
        DiscountKind::ListPrice => (
            base,
            Decimal::ZERO,
            AppliedDiscount::ListPrice { base_price: base },
        ),
        DiscountKind::CustomPercentage { percentage } => {
            let pct = *percentage;
            if pct < Decimal::ZERO || pct > Decimal::ONE_HUNDRED {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Discount percentage {} outside [0, 100]",
                    pct
                )));
            }
            let fraction = pct / Decimal::ONE_HUNDRED;
            let net = base * (Decimal::ONE - fraction);
            let discount = gross_total * fraction;
            (
                net,
                discount,
                AppliedDiscount::CustomPercentage {
                    base_price: base,
                    percentage: pct,
                },
            )
        }
        DiscountKind::CustomAmount { amount } => {
            let amt = *amount;
            if amt < Decimal::ZERO {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Discount amount {} is negative",
                    amt
                )));
            }
            if amt >= gross_total {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Discount amount {} must be below the line value {}",
                    amt,
                    gross_total
                )));
            }
            let net = (gross_total - amt) / qty;
            (
                net,
                amt,
                AppliedDiscount::CustomAmount {
                    base_price: base,
                    amount: amt,
                },
            )
        }
        DiscountKind::PartnerPrice => match partner_price {
            Some(resolved) => {
                let discount = (base - resolved) * qty;
                (
                    resolved,
                    discount,
                    AppliedDiscount::PartnerPrice {
                        base_price: base,
                        partner_price: resolved,
                    },
                )
            }
            // No override on file: fall back to the list price.
            None => (
                base,
                Decimal::ZERO,
                AppliedDiscount::ListPrice { base_price: base },
            ),
        },
        DiscountKind::VolumeTier => {
            // Highest threshold first; the first one the quantity meets wins.
            match price
                .volume_tiers()
                .into_iter()
                .find(|(tier_qty, _)| quantity >= *tier_qty)
            {
                Some((tier_qty, tier_price)) => {
                    let discount = (base - tier_price) * qty;
                    (
                        tier_price,
                        discount,
                        AppliedDiscount::VolumeTier {
                            base_price: base,
                            tier_qty,
                            tier_price,
                        },
                    )
                }
                None => (
                    base,
                    Decimal::ZERO,
                    AppliedDiscount::ListPrice { base_price: base },
                ),
            }
        }
    };

    // Never construct a priced line below zero.
    let (net_unit_price, clamped) = if net_unit_price < Decimal::ZERO {
        tracing::warn!(
            product_id = %price.product_id,
            net_unit_price = %net_unit_price,
            kind = kind.as_str(),
            "Computed net price below zero; clamping"
        );
        (Decimal::ZERO, true)
    } else {
        (net_unit_price, false)
    };

    Ok(LinePricing {
        net_unit_price,
        discount_amount,
        line_total: net_unit_price * qty,
        gross_total,
        applied,
        clamped,
    })
}

/// Aggregate per-line (gross total, discount amount) pairs into quote totals
/// and apply the header discount. The persistence layer feeds this from
/// stored rows; [`LinePricing::totals_pair`] adapts freshly priced lines.
pub fn quote_totals<I>(lines: I, header: HeaderDiscount) -> QuoteTotals
where
    I: IntoIterator<Item = (Decimal, Decimal)>,
{
    let mut item_total = Decimal::ZERO;
    let mut total_item_discounts = Decimal::ZERO;
    for (gross, discount) in lines {
        item_total += gross;
        total_item_discounts += discount;
    }

    let net = item_total - total_item_discounts;
    let total_amount = match header {
        HeaderDiscount::None => net,
        HeaderDiscount::Percentage(pct) => net * (Decimal::ONE - pct / Decimal::ONE_HUNDRED),
        HeaderDiscount::Amount(amt) => net - amt,
    };

    QuoteTotals {
        item_total,
        total_item_discounts,
        total_amount: total_amount.max(Decimal::ZERO),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn product(base: &str) -> ProductPrice {
        ProductPrice {
            product_id: Uuid::new_v4(),
            name: "Widget".to_string(),
            sales_price: dec(base),
            currency: "EUR".to_string(),
            tier1_qty: None,
            tier1_price: None,
            tier2_qty: None,
            tier2_price: None,
            tier3_qty: None,
            tier3_price: None,
            active: true,
            created_utc: Utc::now(),
            modified_utc: None,
        }
    }

    fn tiered_product() -> ProductPrice {
        let mut p = product("1000");
        p.tier1_qty = Some(3);
        p.tier1_price = Some(dec("950"));
        p.tier2_qty = Some(5);
        p.tier2_price = Some(dec("900"));
        p.tier3_qty = Some(10);
        p.tier3_price = Some(dec("850"));
        p
    }

    #[test]
    fn list_price_has_no_discount() {
        let line = price_line(&product("1000"), None, 4, &DiscountKind::ListPrice).unwrap();
        assert_eq!(line.net_unit_price, dec("1000"));
        assert_eq!(line.discount_amount, Decimal::ZERO);
        assert_eq!(line.line_total, dec("4000"));
        assert!(!line.clamped);
    }

    #[test]
    fn custom_percentage_worked_example() {
        // base 1000, qty 3, 10% -> net 900, discount 300, total 2700
        let line = price_line(
            &product("1000"),
            None,
            3,
            &DiscountKind::CustomPercentage {
                percentage: dec("10"),
            },
        )
        .unwrap();
        assert_eq!(line.net_unit_price, dec("900"));
        assert_eq!(line.discount_amount, dec("300"));
        assert_eq!(line.line_total, dec("2700"));
        assert_eq!(
            line.applied,
            AppliedDiscount::CustomPercentage {
                base_price: dec("1000"),
                percentage: dec("10"),
            }
        );
    }

    #[test]
    fn custom_percentage_is_idempotent() {
        let kind = DiscountKind::CustomPercentage {
            percentage: dec("12.5"),
        };
        let a = price_line(&product("1000"), None, 7, &kind).unwrap();
        let b = price_line(&product("1000"), None, 7, &kind).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn percentage_out_of_range_is_rejected() {
        for pct in ["-1", "100.01", "250"] {
            let result = price_line(
                &product("1000"),
                None,
                1,
                &DiscountKind::CustomPercentage {
                    percentage: dec(pct),
                },
            );
            assert!(result.is_err(), "percentage {} should be rejected", pct);
        }
    }

    #[test]
    fn percentage_boundaries_are_accepted() {
        let zero = price_line(
            &product("1000"),
            None,
            2,
            &DiscountKind::CustomPercentage {
                percentage: dec("0"),
            },
        )
        .unwrap();
        assert_eq!(zero.net_unit_price, dec("1000"));

        let full = price_line(
            &product("1000"),
            None,
            2,
            &DiscountKind::CustomPercentage {
                percentage: dec("100"),
            },
        )
        .unwrap();
        assert_eq!(full.net_unit_price, dec("0"));
        assert_eq!(full.discount_amount, dec("2000"));
        assert!(!full.clamped);
    }

    #[test]
    fn custom_amount_is_stored_exactly() {
        let line = price_line(
            &product("1000"),
            None,
            4,
            &DiscountKind::CustomAmount { amount: dec("500") },
        )
        .unwrap();
        assert_eq!(line.discount_amount, dec("500"));
        assert_eq!(line.net_unit_price, dec("875"));
        assert_eq!(line.line_total, dec("3500"));
    }

    #[test]
    fn custom_amount_rejections() {
        // negative
        assert!(price_line(
            &product("1000"),
            None,
            2,
            &DiscountKind::CustomAmount { amount: dec("-1") },
        )
        .is_err());
        // equal to the line value (would zero the net price)
        assert!(price_line(
            &product("1000"),
            None,
            2,
            &DiscountKind::CustomAmount {
                amount: dec("2000")
            },
        )
        .is_err());
        // above the line value
        assert!(price_line(
            &product("1000"),
            None,
            2,
            &DiscountKind::CustomAmount {
                amount: dec("2500")
            },
        )
        .is_err());
    }

    #[test]
    fn partner_price_uses_override() {
        let line = price_line(
            &product("1000"),
            Some(dec("880")),
            5,
            &DiscountKind::PartnerPrice,
        )
        .unwrap();
        assert_eq!(line.net_unit_price, dec("880"));
        assert_eq!(line.discount_amount, dec("600"));
        assert_eq!(line.line_total, dec("4400"));
        assert_eq!(
            line.applied,
            AppliedDiscount::PartnerPrice {
                base_price: dec("1000"),
                partner_price: dec("880"),
            }
        );
    }

    #[test]
    fn partner_price_without_override_falls_back_to_list() {
        let line = price_line(&product("1000"), None, 5, &DiscountKind::PartnerPrice).unwrap();
        assert_eq!(line.net_unit_price, dec("1000"));
        assert_eq!(line.discount_amount, Decimal::ZERO);
        assert_eq!(
            line.applied,
            AppliedDiscount::ListPrice {
                base_price: dec("1000")
            }
        );
    }

    #[test]
    fn volume_tier_worked_example() {
        // tiers {3 -> 950, 5 -> 900, 10 -> 850}; qty 5 selects 900 over 950
        let line = price_line(&tiered_product(), None, 5, &DiscountKind::VolumeTier).unwrap();
        assert_eq!(line.net_unit_price, dec("900"));
        assert_eq!(line.line_total, dec("4500"));
        assert_eq!(line.discount_amount, dec("500"));
        assert_eq!(
            line.applied,
            AppliedDiscount::VolumeTier {
                base_price: dec("1000"),
                tier_qty: 5,
                tier_price: dec("900"),
            }
        );
    }

    #[test]
    fn volume_tier_exact_threshold_selects_that_tier() {
        let line = price_line(&tiered_product(), None, 10, &DiscountKind::VolumeTier).unwrap();
        assert_eq!(line.net_unit_price, dec("850"));

        let line = price_line(&tiered_product(), None, 3, &DiscountKind::VolumeTier).unwrap();
        assert_eq!(line.net_unit_price, dec("950"));
    }

    #[test]
    fn volume_tier_below_all_thresholds_falls_back_to_list() {
        let line = price_line(&tiered_product(), None, 2, &DiscountKind::VolumeTier).unwrap();
        assert_eq!(line.net_unit_price, dec("1000"));
        assert_eq!(line.discount_amount, Decimal::ZERO);
        assert_eq!(
            line.applied,
            AppliedDiscount::ListPrice {
                base_price: dec("1000")
            }
        );
    }

    #[test]
    fn negative_net_price_is_clamped_and_flagged() {
        // A partner override below zero is anomalous reference data; the line
        // must still never be priced below zero.
        let line = price_line(
            &product("100"),
            Some(dec("-50")),
            2,
            &DiscountKind::PartnerPrice,
        )
        .unwrap();
        assert_eq!(line.net_unit_price, Decimal::ZERO);
        assert_eq!(line.line_total, Decimal::ZERO);
        assert!(line.clamped);
    }

    #[test]
    fn non_positive_quantity_is_rejected() {
        assert!(price_line(&product("1000"), None, 0, &DiscountKind::ListPrice).is_err());
        assert!(price_line(&product("1000"), None, -3, &DiscountKind::ListPrice).is_err());
    }

    #[test]
    fn totals_header_percentage_worked_example() {
        // pre-discount sum 2700, item discounts 300, header 10% -> 2160
        let line = price_line(
            &product("900"),
            None,
            3,
            &DiscountKind::CustomAmount { amount: dec("300") },
        )
        .unwrap();
        assert_eq!(line.gross_total, dec("2700"));
        assert_eq!(line.discount_amount, dec("300"));

        let totals = quote_totals([line.totals_pair()], HeaderDiscount::Percentage(dec("10")));
        assert_eq!(totals.item_total, dec("2700"));
        assert_eq!(totals.total_item_discounts, dec("300"));
        assert_eq!(totals.total_amount, dec("2160.0"));
    }

    #[test]
    fn totals_floor_at_zero() {
        let line = price_line(&product("100"), None, 1, &DiscountKind::ListPrice).unwrap();
        let totals = quote_totals([line.totals_pair()], HeaderDiscount::Amount(dec("500")));
        assert_eq!(totals.total_amount, Decimal::ZERO);
    }

    #[test]
    fn totals_round_trip_after_delete_and_re_add() {
        let kind = DiscountKind::CustomPercentage {
            percentage: dec("10"),
        };
        let a = price_line(&product("1000"), None, 3, &kind).unwrap();
        let b = price_line(&tiered_product(), None, 5, &DiscountKind::VolumeTier).unwrap();

        let before = quote_totals([a.totals_pair(), b.totals_pair()], HeaderDiscount::None);
        // Drop the first line, then re-add an identical one.
        let replacement = price_line(&product("1000"), None, 3, &kind).unwrap();
        let after = quote_totals([replacement.totals_pair(), b.totals_pair()], HeaderDiscount::None);
        assert_eq!(before, after);
        assert_eq!(before.total_amount, dec("2700") + dec("4500"));
    }

    #[test]
    fn header_resolve_prefers_percentage() {
        let header = HeaderDiscount::resolve(Some(dec("10")), Some(dec("50"))).unwrap();
        assert_eq!(header, HeaderDiscount::Percentage(dec("10")));
    }

    #[test]
    fn header_resolve_rejects_bad_values() {
        assert!(HeaderDiscount::resolve(Some(dec("101")), None).is_err());
        assert!(HeaderDiscount::resolve(None, Some(dec("-5"))).is_err());
        assert_eq!(
            HeaderDiscount::resolve(None, None).unwrap(),
            HeaderDiscount::None
        );
    }
}
