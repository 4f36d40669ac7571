//! Checkout module.
//!
//! Coupons, discount composition, taxes, shipping, totals and order
//! placement.

mod compose;
mod coupon;
mod order;
mod shipping;
mod summary;
mod tax;
mod totals;

pub use compose::{compose_discounts, ComposedDiscount};
pub use coupon::{
    evaluate_coupon, validate_coupon, AppliedCoupon, Coupon, CouponLookup, CouponUsageRecorder,
    InMemoryCouponBook,
};
pub use order::{place_order, OrderItem, PlacedOrder};
pub use shipping::ShippingRate;
pub use summary::{recompute, CheckoutState, CheckoutSummary, CouponRejection};
pub use tax::{compute_taxes, CountryScope, TaxLine, TaxRule, TaxSummary, TaxType};
pub use totals::{aggregate_totals, OrderTotals};
