//! Discount rule types and the automatic order-wide discount.

use crate::ids::{CategoryId, DiscountId, ProductId};
use crate::money::percent_of;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Activation window of a rule or coupon.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActiveWindow {
    /// Start of the window (inclusive), open-ended when unset.
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    /// End of the window (inclusive), open-ended when unset.
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
}

/// Where `now` falls relative to an [`ActiveWindow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowStatus {
    NotStarted,
    Open,
    Ended,
}

impl ActiveWindow {
    /// A window that opens at `starts_at` and never closes.
    pub fn starting(starts_at: DateTime<Utc>) -> Self {
        Self {
            starts_at: Some(starts_at),
            ends_at: None,
        }
    }

    /// A window between two instants.
    pub fn between(starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Self {
        Self {
            starts_at: Some(starts_at),
            ends_at: Some(ends_at),
        }
    }

    pub fn status(&self, now: DateTime<Utc>) -> WindowStatus {
        if self.starts_at.is_some_and(|start| now < start) {
            WindowStatus::NotStarted
        } else if self.ends_at.is_some_and(|end| now > end) {
            WindowStatus::Ended
        } else {
            WindowStatus::Open
        }
    }

    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.status(now) == WindowStatus::Open
    }
}

/// Which items a discount or coupon applies to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum Applicability {
    /// Every product except the excluded ones.
    All {
        #[serde(default)]
        excluded_product_ids: Vec<ProductId>,
        #[serde(default)]
        excluded_category_ids: Vec<CategoryId>,
    },
    /// Only the listed products.
    SpecificProducts { product_ids: Vec<ProductId> },
    /// Only products in the listed categories.
    SpecificCategories { category_ids: Vec<CategoryId> },
}

impl Applicability {
    /// Scope covering every product with no exclusions.
    pub fn all() -> Self {
        Applicability::All {
            excluded_product_ids: Vec::new(),
            excluded_category_ids: Vec::new(),
        }
    }

    /// Resolution priority; lower wins.
    pub fn priority(&self) -> u8 {
        match self {
            Applicability::SpecificProducts { .. } => 1,
            Applicability::SpecificCategories { .. } => 2,
            Applicability::All { .. } => 3,
        }
    }

    /// Whether an item with this product and category is in scope.
    pub fn applies_to(&self, product_id: &ProductId, category_id: Option<&CategoryId>) -> bool {
        match self {
            Applicability::All {
                excluded_product_ids,
                excluded_category_ids,
            } => {
                !excluded_product_ids.contains(product_id)
                    && !category_id.is_some_and(|c| excluded_category_ids.contains(c))
            }
            Applicability::SpecificProducts { product_ids } => product_ids.contains(product_id),
            Applicability::SpecificCategories { category_ids } => {
                category_id.is_some_and(|c| category_ids.contains(c))
            }
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Applicability::All { .. })
    }
}

/// Amount taken off by a discount or coupon.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "discount_type", content = "value", rename_all = "snake_case")]
pub enum DiscountValue {
    /// Percentage off (0 - 100).
    Percentage(Decimal),
    /// Fixed amount off.
    FixedAmount(Decimal),
}

impl DiscountValue {
    /// Savings on `amount`, unrounded and uncapped.
    pub fn savings_on(&self, amount: Decimal) -> Decimal {
        match self {
            DiscountValue::Percentage(percent) => percent_of(amount, *percent),
            DiscountValue::FixedAmount(value) => *value,
        }
    }

    pub fn is_percentage(&self) -> bool {
        matches!(self, DiscountValue::Percentage(_))
    }
}

/// An automatic discount configured by the merchant.
///
/// Ungated rules (no minimum order value) lower displayed item prices;
/// gated rules act as order-wide "spend X, get Y off" promotions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscountRule {
    /// Unique rule identifier.
    pub id: DiscountId,
    /// Display name.
    pub name: String,
    /// Whether the merchant has switched the rule on.
    pub active: bool,
    /// When the rule is in effect.
    #[serde(default)]
    pub window: ActiveWindow,
    /// Items the rule applies to.
    pub applies_to: Applicability,
    /// Amount taken off.
    pub discount: DiscountValue,
    /// Minimum order value gate.
    #[serde(default)]
    pub min_order_value: Option<Decimal>,
    /// Creation time, used to break ties deterministically.
    pub created_at: DateTime<Utc>,
}

impl DiscountRule {
    /// Active and within its window.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.active && self.window.contains(now)
    }

    /// Has a minimum order value gate (even a zero one).
    pub fn is_gated(&self) -> bool {
        self.min_order_value.is_some()
    }

    /// Tie-break order between equally good rules: newer first, then id.
    pub(crate) fn recency_cmp(&self, other: &DiscountRule) -> Ordering {
        self.created_at
            .cmp(&other.created_at)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// The best automatic order-wide discount for a subtotal.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OrderDiscount {
    /// Amount taken off the subtotal, unrounded.
    pub amount: Decimal,
    /// Name of the winning rule.
    pub name: Option<String>,
    /// ID of the winning rule.
    pub rule_id: Option<DiscountId>,
}

impl OrderDiscount {
    /// No order discount.
    pub fn none() -> Self {
        Self::default()
    }
}

/// Resolve the automatic order discount using the current time.
pub fn resolve_order_discount(subtotal: Decimal, rules: &[DiscountRule]) -> OrderDiscount {
    resolve_order_discount_at(subtotal, rules, Utc::now())
}

/// Resolve the automatic order discount at `now`.
///
/// Only live rules with a satisfied minimum order value compete. The largest
/// amount wins; ties go to the most recently created rule.
pub fn resolve_order_discount_at(
    subtotal: Decimal,
    rules: &[DiscountRule],
    now: DateTime<Utc>,
) -> OrderDiscount {
    let best = rules
        .iter()
        .filter(|rule| rule.is_live(now))
        .filter(|rule| rule.min_order_value.is_some_and(|mov| subtotal >= mov))
        .map(|rule| {
            let amount = rule
                .discount
                .savings_on(subtotal)
                .min(subtotal)
                .max(Decimal::ZERO);
            (rule, amount)
        })
        .max_by(|(a, amount_a), (b, amount_b)| {
            amount_a.cmp(amount_b).then_with(|| a.recency_cmp(b))
        });

    match best {
        Some((rule, amount)) => {
            tracing::debug!(rule = %rule.id, %amount, %subtotal, "order discount selected");
            OrderDiscount {
                amount,
                name: Some(rule.name.clone()),
                rule_id: Some(rule.id.clone()),
            }
        }
        None => OrderDiscount::none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn gated(id: &str, discount: DiscountValue, mov: Decimal, age_days: i64) -> DiscountRule {
        DiscountRule {
            id: DiscountId::new(id),
            name: id.to_uppercase(),
            active: true,
            window: ActiveWindow::starting(now() - Duration::days(30)),
            applies_to: Applicability::all(),
            discount,
            min_order_value: Some(mov),
            created_at: now() - Duration::days(age_days),
        }
    }

    #[test]
    fn test_window_status() {
        let window = ActiveWindow::between(now(), now() + Duration::days(1));
        assert_eq!(window.status(now() - Duration::seconds(1)), WindowStatus::NotStarted);
        assert_eq!(window.status(now()), WindowStatus::Open);
        assert_eq!(window.status(now() + Duration::days(2)), WindowStatus::Ended);
        assert!(ActiveWindow::default().contains(now()));
    }

    #[test]
    fn test_applicability_all_respects_exclusions() {
        let scope = Applicability::All {
            excluded_product_ids: vec![ProductId::new("gift-card")],
            excluded_category_ids: vec![CategoryId::new("clearance")],
        };
        let shoes = CategoryId::new("shoes");
        let clearance = CategoryId::new("clearance");

        assert!(scope.applies_to(&ProductId::new("boot"), Some(&shoes)));
        assert!(scope.applies_to(&ProductId::new("boot"), None));
        assert!(!scope.applies_to(&ProductId::new("gift-card"), Some(&shoes)));
        assert!(!scope.applies_to(&ProductId::new("boot"), Some(&clearance)));
    }

    #[test]
    fn test_applicability_specific_scopes() {
        let by_product = Applicability::SpecificProducts {
            product_ids: vec![ProductId::new("boot")],
        };
        let by_category = Applicability::SpecificCategories {
            category_ids: vec![CategoryId::new("shoes")],
        };

        assert!(by_product.applies_to(&ProductId::new("boot"), None));
        assert!(!by_product.applies_to(&ProductId::new("sock"), None));
        assert!(by_category.applies_to(&ProductId::new("sock"), Some(&CategoryId::new("shoes"))));
        assert!(!by_category.applies_to(&ProductId::new("sock"), None));
        assert!(by_product.priority() < by_category.priority());
        assert!(by_category.priority() < Applicability::all().priority());
    }

    #[test]
    fn test_applicability_serde_shape() {
        let json = r#"{"scope":"specific_categories","category_ids":["shoes"]}"#;
        let scope: Applicability = serde_json::from_str(json).unwrap();
        assert_eq!(
            scope,
            Applicability::SpecificCategories {
                category_ids: vec![CategoryId::new("shoes")]
            }
        );

        let all: Applicability = serde_json::from_str(r#"{"scope":"all"}"#).unwrap();
        assert_eq!(all, Applicability::all());
    }

    #[test]
    fn test_discount_value_savings() {
        assert_eq!(DiscountValue::Percentage(dec!(15)).savings_on(dec!(40)), dec!(6));
        assert_eq!(DiscountValue::FixedAmount(dec!(5)).savings_on(dec!(40)), dec!(5));
    }

    #[test]
    fn test_order_discount_requires_gate() {
        let mut rule = gated("spend50", DiscountValue::Percentage(dec!(10)), dec!(50), 1);
        rule.min_order_value = None;

        let result = resolve_order_discount_at(dec!(100), &[rule], now());
        assert_eq!(result, OrderDiscount::none());
    }

    #[test]
    fn test_order_discount_gate_threshold() {
        let rule = gated("spend50", DiscountValue::FixedAmount(dec!(5)), dec!(50), 1);

        let below = resolve_order_discount_at(dec!(49.99), &[rule.clone()], now());
        assert_eq!(below.amount, Decimal::ZERO);

        let at = resolve_order_discount_at(dec!(50), &[rule], now());
        assert_eq!(at.amount, dec!(5));
        assert_eq!(at.name.as_deref(), Some("SPEND50"));
    }

    #[test]
    fn test_order_discount_picks_largest_amount() {
        let rules = vec![
            gated("pct", DiscountValue::Percentage(dec!(10)), dec!(0), 5),
            gated("flat", DiscountValue::FixedAmount(dec!(15)), dec!(100), 5),
        ];

        let small = resolve_order_discount_at(dec!(80), &rules, now());
        assert_eq!(small.rule_id, Some(DiscountId::new("pct")));
        assert_eq!(small.amount, dec!(8));

        let large = resolve_order_discount_at(dec!(120), &rules, now());
        assert_eq!(large.rule_id, Some(DiscountId::new("flat")));
        assert_eq!(large.amount, dec!(15));
    }

    #[test]
    fn test_order_discount_tie_goes_to_newest_rule() {
        let rules = vec![
            gated("older", DiscountValue::FixedAmount(dec!(10)), dec!(0), 10),
            gated("newer", DiscountValue::FixedAmount(dec!(10)), dec!(0), 1),
        ];

        let result = resolve_order_discount_at(dec!(100), &rules, now());
        assert_eq!(result.rule_id, Some(DiscountId::new("newer")));

        let reversed: Vec<_> = rules.into_iter().rev().collect();
        let result = resolve_order_discount_at(dec!(100), &reversed, now());
        assert_eq!(result.rule_id, Some(DiscountId::new("newer")));
    }

    #[test]
    fn test_order_discount_same_age_tie_goes_to_greater_id() {
        let rules = vec![
            gated("spring-a", DiscountValue::FixedAmount(dec!(10)), dec!(0), 3),
            gated("spring-b", DiscountValue::Percentage(dec!(10)), dec!(0), 3),
        ];

        let result = resolve_order_discount_at(dec!(100), &rules, now());
        assert_eq!(result.rule_id, Some(DiscountId::new("spring-b")));

        let reversed: Vec<_> = rules.into_iter().rev().collect();
        let result = resolve_order_discount_at(dec!(100), &reversed, now());
        assert_eq!(result.rule_id, Some(DiscountId::new("spring-b")));
    }

    #[test]
    fn test_order_discount_skips_inactive_and_expired() {
        let mut inactive = gated("off", DiscountValue::FixedAmount(dec!(30)), dec!(0), 1);
        inactive.active = false;
        let mut expired = gated("old", DiscountValue::FixedAmount(dec!(20)), dec!(0), 1);
        expired.window = ActiveWindow::between(now() - Duration::days(9), now() - Duration::days(2));
        let live = gated("live", DiscountValue::FixedAmount(dec!(1)), dec!(0), 1);

        let result = resolve_order_discount_at(dec!(100), &[inactive, expired, live], now());
        assert_eq!(result.rule_id, Some(DiscountId::new("live")));
    }

    #[test]
    fn test_order_discount_capped_at_subtotal() {
        let rule = gated("big", DiscountValue::FixedAmount(dec!(500)), dec!(10), 1);
        let result = resolve_order_discount_at(dec!(40), &[rule], now());
        assert_eq!(result.amount, dec!(40));
    }
}
