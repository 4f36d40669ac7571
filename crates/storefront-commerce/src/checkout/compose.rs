//! Combining the automatic order discount with a coupon.

use crate::cart::OrderDiscount;
use crate::checkout::AppliedCoupon;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The discount taken off an order, split by source.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ComposedDiscount {
    pub order_amount: Decimal,
    pub coupon_amount: Decimal,
    /// Sum of both, never above the subtotal.
    pub total: Decimal,
}

/// Combine the order discount and an optional coupon.
///
/// The order discount comes off first. A percentage coupon that covers the
/// whole store is then taken from what remains; any other coupon keeps the
/// amount it was validated with. When the sum would exceed the subtotal the
/// coupon share shrinks.
///
/// Exclusions on a store-wide percentage coupon are not applied when it
/// compounds: the rate is taken from the whole remainder, excluded items
/// included, so the result can exceed the coupon's validated amount.
pub fn compose_discounts(
    subtotal: Decimal,
    order_discount: &OrderDiscount,
    coupon: Option<&AppliedCoupon>,
) -> ComposedDiscount {
    let subtotal = subtotal.max(Decimal::ZERO);
    let order_amount = order_discount.amount.clamp(Decimal::ZERO, subtotal);
    let remainder = subtotal - order_amount;

    let coupon_amount = coupon
        .map(|applied| {
            if applied.coupon.compounds() {
                applied.coupon.discount.savings_on(remainder)
            } else {
                applied.discount_amount
            }
        })
        .unwrap_or(Decimal::ZERO)
        .clamp(Decimal::ZERO, remainder);

    ComposedDiscount {
        order_amount,
        coupon_amount,
        total: order_amount + coupon_amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::{Applicability, DiscountValue};
    use crate::checkout::Coupon;
    use crate::ids::{CategoryId, DiscountId};
    use rust_decimal_macros::dec;

    fn order_discount(amount: Decimal) -> OrderDiscount {
        OrderDiscount {
            amount,
            name: Some("Spend more".to_string()),
            rule_id: Some(DiscountId::new("auto")),
        }
    }

    fn applied(discount: DiscountValue, applies_to: Applicability, amount: Decimal) -> AppliedCoupon {
        let mut coupon = Coupon::new("c-1", "store-1", "CODE", discount);
        coupon.applies_to = applies_to;
        AppliedCoupon {
            coupon,
            discount_amount: amount,
            eligible_subtotal: dec!(100),
        }
    }

    #[test]
    fn test_no_discounts() {
        let composed = compose_discounts(dec!(100), &OrderDiscount::none(), None);
        assert_eq!(composed, ComposedDiscount::default());
    }

    #[test]
    fn test_percentage_coupon_compounds_on_remainder() {
        let coupon = applied(DiscountValue::Percentage(dec!(20)), Applicability::all(), dec!(20));
        let composed = compose_discounts(dec!(100), &order_discount(dec!(10)), Some(&coupon));

        assert_eq!(composed.order_amount, dec!(10));
        assert_eq!(composed.coupon_amount, dec!(18));
        assert_eq!(composed.total, dec!(28));
    }

    #[test]
    fn test_compounding_ignores_store_wide_exclusions() {
        let scope = Applicability::All {
            excluded_product_ids: vec![crate::ids::ProductId::new("gift-card")],
            excluded_category_ids: Vec::new(),
        };
        // Validated on the 50 of non-excluded items, compounded on all 100.
        let coupon = applied(DiscountValue::Percentage(dec!(20)), scope, dec!(10));
        let composed = compose_discounts(dec!(100), &OrderDiscount::none(), Some(&coupon));

        assert_eq!(composed.coupon_amount, dec!(20));
    }

    #[test]
    fn test_scoped_coupon_keeps_validated_amount() {
        let scope = Applicability::SpecificCategories {
            category_ids: vec![CategoryId::new("home")],
        };
        let coupon = applied(DiscountValue::Percentage(dec!(20)), scope, dec!(12));
        let composed = compose_discounts(dec!(100), &order_discount(dec!(10)), Some(&coupon));

        assert_eq!(composed.coupon_amount, dec!(12));
        assert_eq!(composed.total, dec!(22));
    }

    #[test]
    fn test_fixed_coupon_does_not_compound() {
        let coupon = applied(DiscountValue::FixedAmount(dec!(15)), Applicability::all(), dec!(15));
        let composed = compose_discounts(dec!(100), &order_discount(dec!(10)), Some(&coupon));
        assert_eq!(composed.total, dec!(25));
    }

    #[test]
    fn test_total_capped_by_reducing_coupon() {
        let coupon = applied(DiscountValue::FixedAmount(dec!(50)), Applicability::all(), dec!(50));
        let composed = compose_discounts(dec!(60), &order_discount(dec!(20)), Some(&coupon));

        assert_eq!(composed.order_amount, dec!(20));
        assert_eq!(composed.coupon_amount, dec!(40));
        assert_eq!(composed.total, dec!(60));
    }
}
