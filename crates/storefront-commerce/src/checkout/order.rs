//! Placed order records.

use crate::checkout::{evaluate_coupon, recompute, CheckoutState, OrderTotals};
use crate::error::CommerceError;
use crate::ids::{CouponId, OrderId, ProductId, ShippingRateId, StoreId, VariantId};
use crate::money::round_money;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An order as persisted at placement time. Its totals never change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlacedOrder {
    /// Unique order identifier.
    pub id: OrderId,
    /// Human-readable order number.
    pub order_number: String,
    pub store_id: StoreId,
    /// Items in the order.
    pub items: Vec<OrderItem>,
    #[serde(flatten)]
    pub totals: OrderTotals,
    /// Name of the automatic order discount, if one applied.
    #[serde(default)]
    pub discount_label: Option<String>,
    #[serde(default)]
    pub coupon_id: Option<CouponId>,
    #[serde(default)]
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub shipping_rate_id: Option<ShippingRateId>,
    #[serde(default)]
    pub country: Option<String>,
    pub placed_at: DateTime<Utc>,
}

impl PlacedOrder {
    /// Get total item count.
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Order number derived from the placement time.
    pub fn order_number_at(placed_at: DateTime<Utc>) -> String {
        format!("ORD-{}", placed_at.format("%Y%m%d-%H%M%S"))
    }
}

/// A line of a placed order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub product_id: ProductId,
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    /// Product name at time of order.
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    pub quantity: u32,
    /// Unit price charged.
    pub unit_price: Decimal,
    /// Anchor price when the item was discounted.
    #[serde(default)]
    pub original_price: Option<Decimal>,
    /// Unit price times quantity, rounded.
    pub line_total: Decimal,
}

/// Build the order record for a checkout.
///
/// The checkout is recomputed first. An applied coupon that no longer
/// qualifies fails the placement so the customer sees the new price before
/// paying it.
pub fn place_order(state: &CheckoutState, now: DateTime<Utc>) -> Result<PlacedOrder, CommerceError> {
    if state.cart.is_empty() {
        return Err(CommerceError::EmptyCart);
    }

    if let Some(applied) = &state.applied_coupon {
        let subtotal = state.cart.subtotal();
        evaluate_coupon(&applied.coupon, &state.cart, subtotal, now)?;
    }
    let summary = recompute(state, now);

    let items = state
        .cart
        .lines
        .iter()
        .map(|line| OrderItem {
            product_id: line.product_id.clone(),
            variant_id: line.variant_id.clone(),
            name: line.name.clone(),
            image: line.image.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            original_price: line.compare_at_price.filter(|_| line.is_discounted()),
            line_total: round_money(line.line_total()),
        })
        .collect();

    let id = OrderId::generate();
    let order = PlacedOrder {
        order_number: PlacedOrder::order_number_at(now),
        store_id: state.cart.store_id.clone(),
        items,
        totals: summary.totals,
        discount_label: summary.order_discount.name,
        coupon_id: summary.coupon.as_ref().map(|c| c.coupon.id.clone()),
        coupon_code: summary.coupon.as_ref().map(|c| c.coupon.code.clone()),
        shipping_rate_id: state.shipping.as_ref().map(|rate| rate.id.clone()),
        country: state.country.clone(),
        placed_at: now,
        id,
    };

    tracing::info!(
        order = %order.id,
        store = %order.store_id,
        total = %order.totals.total,
        coupon = order.coupon_code.as_deref().unwrap_or("-"),
        "order placed"
    );
    Ok(order)
}
