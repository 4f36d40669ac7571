//! Checkout state and its explicit recomputation.
//!
//! Nothing in the checkout recomputes behind the caller's back: whenever
//! the cart, coupon, country or shipping choice changes, call [`recompute`]
//! (or [`CheckoutState::refresh`]) and render the returned summary.

use crate::cart::{resolve_order_discount_at, Cart, DiscountRule, OrderDiscount};
use crate::checkout::{
    aggregate_totals, compose_discounts, compute_taxes, evaluate_coupon, AppliedCoupon,
    ComposedDiscount, OrderTotals, ShippingRate, TaxRule, TaxSummary,
};
use crate::error::{CommerceError, ErrorKind};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Everything the checkout page prices from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckoutState {
    pub cart: Cart,
    /// Automatic discount rules of the store.
    #[serde(default)]
    pub discount_rules: Vec<DiscountRule>,
    /// Coupon the customer applied, as last validated.
    #[serde(default)]
    pub applied_coupon: Option<AppliedCoupon>,
    #[serde(default)]
    pub tax_rules: Vec<TaxRule>,
    /// Chosen shipping rate, if any yet.
    #[serde(default)]
    pub shipping: Option<ShippingRate>,
    /// Destination country, used to select tax rules.
    #[serde(default)]
    pub country: Option<String>,
}

impl CheckoutState {
    pub fn new(cart: Cart) -> Self {
        Self {
            cart,
            discount_rules: Vec::new(),
            applied_coupon: None,
            tax_rules: Vec::new(),
            shipping: None,
            country: None,
        }
    }

    /// Recompute and drop a coupon that no longer qualifies.
    pub fn refresh(&mut self, now: DateTime<Utc>) -> CheckoutSummary {
        let summary = recompute(self, now);
        self.applied_coupon = summary.coupon.clone();
        summary
    }
}

/// Why a previously applied coupon was dropped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CouponRejection {
    pub code: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl CouponRejection {
    fn new(code: &str, error: &CommerceError) -> Self {
        Self {
            code: code.to_string(),
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Priced view of a checkout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckoutSummary {
    /// Unrounded sum of the cart lines.
    pub subtotal: Decimal,
    pub order_discount: OrderDiscount,
    /// The coupon still in effect.
    pub coupon: Option<AppliedCoupon>,
    /// Set when the applied coupon had to be dropped.
    pub coupon_rejection: Option<CouponRejection>,
    pub discounts: ComposedDiscount,
    /// Unrounded taxes.
    pub taxes: TaxSummary,
    pub totals: OrderTotals,
}

/// Price the checkout at `now`.
pub fn recompute(state: &CheckoutState, now: DateTime<Utc>) -> CheckoutSummary {
    let cart = &state.cart;
    let subtotal = cart.subtotal();
    let order_discount = resolve_order_discount_at(subtotal, &state.discount_rules, now);

    let (coupon, coupon_rejection) = match &state.applied_coupon {
        Some(applied) => match evaluate_coupon(&applied.coupon, cart, subtotal, now) {
            Ok(fresh) => (Some(fresh), None),
            Err(e) => {
                tracing::warn!(code = %applied.code(), error = %e, "applied coupon dropped");
                (None, Some(CouponRejection::new(applied.code(), &e)))
            }
        },
        None => (None, None),
    };

    let discounts = compose_discounts(subtotal, &order_discount, coupon.as_ref());
    let shipping_cost = state
        .shipping
        .as_ref()
        .map(|rate| rate.cost_for(cart.item_count()))
        .unwrap_or(Decimal::ZERO);
    let taxes = compute_taxes(
        cart,
        state.country.as_deref().unwrap_or_default(),
        &state.tax_rules,
    );
    let totals = aggregate_totals(subtotal, discounts.total, shipping_cost, &taxes, cart.currency);

    CheckoutSummary {
        subtotal,
        order_discount,
        coupon,
        coupon_rejection,
        discounts,
        taxes,
        totals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::{ActiveWindow, Applicability, CartLine, DiscountValue};
    use crate::checkout::{Coupon, CountryScope, TaxType};
    use crate::ids::{DiscountId, TaxRuleId};
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 20, 18, 0, 0).unwrap()
    }

    fn state_with_subtotal(amount: Decimal) -> CheckoutState {
        let mut cart = Cart::new("store-1");
        cart.lines.push(CartLine::new("rug", "Rug", amount, 1));
        CheckoutState::new(cart)
    }

    fn save20(state: &CheckoutState) -> AppliedCoupon {
        let coupon = Coupon::new("c-1", "store-1", "SAVE20", DiscountValue::Percentage(dec!(20)));
        evaluate_coupon(&coupon, &state.cart, state.cart.subtotal(), now()).unwrap()
    }

    #[test]
    fn test_plain_cart() {
        let mut state = state_with_subtotal(dec!(40));
        state.shipping = Some(ShippingRate::new("std", "Standard", dec!(5)));

        let summary = recompute(&state, now());
        assert_eq!(summary.totals.total, dec!(45));
        assert_eq!(summary.discounts.total, Decimal::ZERO);
        assert!(summary.coupon_rejection.is_none());
    }

    #[test]
    fn test_order_discount_and_coupon_compound() {
        let mut state = state_with_subtotal(dec!(100));
        state.discount_rules.push(DiscountRule {
            id: DiscountId::new("auto"),
            name: "Ten off everything".to_string(),
            active: true,
            window: ActiveWindow::default(),
            applies_to: Applicability::all(),
            discount: DiscountValue::Percentage(dec!(10)),
            min_order_value: Some(Decimal::ZERO),
            created_at: now() - Duration::days(1),
        });
        state.applied_coupon = Some(save20(&state));

        let summary = recompute(&state, now());
        assert_eq!(summary.order_discount.amount, dec!(10));
        assert_eq!(summary.discounts.coupon_amount, dec!(18));
        assert_eq!(summary.totals.discount_total, dec!(28));
        assert_eq!(summary.totals.total, dec!(72));
    }

    #[test]
    fn test_coupon_dropped_when_cart_no_longer_qualifies() {
        let mut state = state_with_subtotal(dec!(80));
        let mut applied = save20(&state);
        applied.coupon.min_order_value = Some(dec!(60));
        state.applied_coupon = Some(applied);

        state.cart.lines[0].unit_price = dec!(50);
        let summary = state.refresh(now());

        assert!(summary.coupon.is_none());
        let rejection = summary.coupon_rejection.unwrap();
        assert_eq!(rejection.code, "SAVE20");
        assert_eq!(rejection.kind, ErrorKind::Ineligible);
        assert!(state.applied_coupon.is_none());
        assert_eq!(summary.totals.total, dec!(50));
    }

    #[test]
    fn test_coupon_amount_follows_cart_changes() {
        let mut state = state_with_subtotal(dec!(100));
        state.applied_coupon = Some(save20(&state));
        state.cart.lines[0].quantity = 2;

        let summary = recompute(&state, now());
        assert_eq!(summary.discounts.coupon_amount, dec!(40));
    }

    #[test]
    fn test_taxes_for_destination_country() {
        let mut state = state_with_subtotal(dec!(50));
        state.tax_rules.push(TaxRule {
            id: TaxRuleId::new("vat"),
            active: true,
            country: CountryScope::Country("Ireland".to_string()),
            code: "vat".to_string(),
            label: "VAT".to_string(),
            tax_type: TaxType::Percentage,
            rate: dec!(20),
            apply_per_item: false,
        });

        assert_eq!(recompute(&state, now()).totals.tax_total, Decimal::ZERO);

        state.country = Some("ireland".to_string());
        let summary = recompute(&state, now());
        assert_eq!(summary.totals.tax_total, dec!(10));
        assert_eq!(summary.totals.total, dec!(60));
    }

    #[test]
    fn test_no_country_applies_only_store_wide_taxes() {
        let mut state = state_with_subtotal(dec!(50));
        let scopes = [
            ("vat", CountryScope::All),
            ("blank", CountryScope::Country(String::new())),
        ];
        for (code, country) in scopes {
            state.tax_rules.push(TaxRule {
                id: TaxRuleId::new(code),
                active: true,
                country,
                code: code.to_string(),
                label: code.to_uppercase(),
                tax_type: TaxType::Percentage,
                rate: dec!(10),
                apply_per_item: false,
            });
        }

        let summary = recompute(&state, now());
        assert_eq!(summary.totals.tax_total, dec!(5));
        assert_eq!(summary.totals.tax_breakdown.keys().collect::<Vec<_>>(), vec!["vat"]);
    }
}
