//! Shopping cart module.
//!
//! Contains the cart and its lines, the per-item price resolver, discount
//! rules and the reconciler that re-derives lines from live catalog data.

mod cart;
mod discount;
mod pricing;
mod reconcile;
#[cfg(feature = "storage")]
mod store;

pub use cart::{Cart, CartLine, MAX_QUANTITY_PER_ITEM};
pub use discount::{
    resolve_order_discount, resolve_order_discount_at, ActiveWindow, Applicability,
    DiscountRule, DiscountValue, OrderDiscount, WindowStatus,
};
pub use pricing::{resolve_price, resolve_price_at, PriceResult, PricedEntity};
pub use reconcile::{
    reconcile_cart, ClampedLine, ReconcileReport, RemovalReason, RemovedLine, RepricedLine,
};
#[cfg(feature = "storage")]
pub use store::CartStore;
