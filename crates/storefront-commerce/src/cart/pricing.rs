//! Per-item price resolution against automatic discount rules.

use crate::cart::DiscountRule;
use crate::ids::{CategoryId, DiscountId, ProductId};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// The priced view of a product or variant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricedEntity {
    pub product_id: ProductId,
    pub category_id: Option<CategoryId>,
    /// Current selling price before automatic discounts.
    pub price: Decimal,
    /// Merchant-set compare-at price.
    pub compare_at_price: Option<Decimal>,
}

/// Display price of an item after automatic discounts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceResult {
    /// Price the customer pays per unit.
    pub final_price: Decimal,
    /// Struck-through anchor price, when there is a discount to show.
    pub compare_at_price: Option<Decimal>,
    pub has_discount: bool,
    /// Spread between anchor and final price, in whole percent.
    pub discount_pct: u32,
    /// Name of the winning rule.
    pub discount_label: Option<String>,
    /// ID of the winning rule.
    pub rule_id: Option<DiscountId>,
}

impl PriceResult {
    /// Savings per unit relative to the anchor price.
    pub fn savings(&self) -> Decimal {
        self.compare_at_price
            .map(|anchor| (anchor - self.final_price).max(Decimal::ZERO))
            .unwrap_or(Decimal::ZERO)
    }
}

/// Resolve an item's display price using the current time.
pub fn resolve_price(entity: &PricedEntity, rules: &[DiscountRule]) -> PriceResult {
    resolve_price_at(entity, rules, Utc::now())
}

/// Resolve an item's display price at `now`.
///
/// Only live rules without a minimum order value take part, since an item
/// price must not promise a discount the cart may not qualify for. The most
/// specific scope that matches wins outright (products, then categories, then
/// all); within it the rule with the largest absolute saving is applied.
pub fn resolve_price_at(
    entity: &PricedEntity,
    rules: &[DiscountRule],
    now: DateTime<Utc>,
) -> PriceResult {
    let candidates: Vec<&DiscountRule> = rules
        .iter()
        .filter(|rule| rule.is_live(now) && !rule.is_gated())
        .filter(|rule| {
            rule.applies_to
                .applies_to(&entity.product_id, entity.category_id.as_ref())
        })
        .collect();

    let best_tier = candidates.iter().map(|rule| rule.applies_to.priority()).min();

    let winner = best_tier.and_then(|tier| {
        candidates
            .iter()
            .filter(|rule| rule.applies_to.priority() == tier)
            .map(|rule| (*rule, rule.discount.savings_on(entity.price)))
            .max_by(|(a, savings_a), (b, savings_b)| {
                savings_a.cmp(savings_b).then_with(|| a.recency_cmp(b))
            })
    });

    match winner {
        Some((rule, savings)) => {
            let anchor = entity
                .compare_at_price
                .map_or(entity.price, |compare| compare.max(entity.price));
            let final_price = (entity.price - savings).max(Decimal::ZERO);

            tracing::debug!(
                product = %entity.product_id,
                rule = %rule.id,
                %savings,
                "item discount applied"
            );

            PriceResult {
                final_price,
                compare_at_price: Some(anchor),
                has_discount: anchor > final_price,
                discount_pct: spread_percent(anchor, final_price),
                discount_label: Some(rule.name.clone()),
                rule_id: Some(rule.id.clone()),
            }
        }
        None => static_price(entity),
    }
}

/// A merchant compare-at price above the selling price still reads as a sale.
fn static_price(entity: &PricedEntity) -> PriceResult {
    match entity.compare_at_price {
        Some(compare) if compare > entity.price => PriceResult {
            final_price: entity.price,
            compare_at_price: Some(compare),
            has_discount: true,
            discount_pct: spread_percent(compare, entity.price),
            discount_label: None,
            rule_id: None,
        },
        _ => PriceResult {
            final_price: entity.price,
            compare_at_price: None,
            has_discount: false,
            discount_pct: 0,
            discount_label: None,
            rule_id: None,
        },
    }
}

fn spread_percent(anchor: Decimal, final_price: Decimal) -> u32 {
    if anchor <= Decimal::ZERO {
        return 0;
    }
    ((anchor - final_price) / anchor * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .unwrap_or(0)
}
