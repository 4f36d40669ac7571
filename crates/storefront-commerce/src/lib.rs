//! Checkout pricing and discount resolution for storefronts.
//!
//! This crate turns a cart, the live catalog, merchant discount rules, an
//! optional coupon, tax rules and a shipping choice into an itemized order
//! total:
//!
//! - **Catalog**: Products, variants and the live catalog source
//! - **Cart**: Cart lines, per-item price resolution, automatic discounts,
//!   reconciliation and persistence
//! - **Checkout**: Coupons, discount composition, taxes, shipping, totals
//!   and order placement
//!
//! Amounts are kept at full precision and rounded to cents only when the
//! totals are aggregated.
//!
//! # Example
//!
//! ```rust,ignore
//! use storefront_commerce::prelude::*;
//!
//! let catalog = InMemoryCatalog::new(products, rules.clone());
//! let report = reconcile_cart(&cart, &catalog, config.fetch_timeout(), Utc::now()).await?;
//!
//! let mut state = CheckoutState::new(report.cart);
//! state.discount_rules = rules;
//! state.applied_coupon = Some(
//!     validate_coupon("SAVE20", &state.cart, state.cart.subtotal(), &coupons,
//!         config.coupon_lookup_timeout(), Utc::now()).await?,
//! );
//!
//! let summary = state.refresh(Utc::now());
//! println!("Total: {}", summary.totals.total_money());
//! ```

pub mod config;
pub mod error;
pub mod ids;
pub mod money;

pub mod cart;
pub mod catalog;
pub mod checkout;

pub use config::EngineConfig;
pub use error::{CommerceError, ErrorKind};
pub use ids::*;
pub use money::{Currency, Money};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::error::{CommerceError, ErrorKind};
    pub use crate::ids::*;
    pub use crate::money::{round_money, Currency, Money};

    // Catalog
    pub use crate::catalog::{CatalogSnapshot, CatalogSource, InMemoryCatalog, Product, ProductVariant};

    // Cart
    pub use crate::cart::{
        reconcile_cart, resolve_order_discount, resolve_order_discount_at, resolve_price,
        resolve_price_at, ActiveWindow, Applicability, Cart, CartLine, DiscountRule,
        DiscountValue, OrderDiscount, PriceResult, PricedEntity, ReconcileReport,
    };
    #[cfg(feature = "storage")]
    pub use crate::cart::CartStore;

    // Checkout
    pub use crate::checkout::{
        aggregate_totals, compose_discounts, compute_taxes, evaluate_coupon, place_order,
        recompute, validate_coupon, AppliedCoupon, CheckoutState, CheckoutSummary,
        ComposedDiscount, CountryScope, Coupon, CouponLookup, CouponUsageRecorder,
        InMemoryCouponBook, OrderTotals, PlacedOrder, ShippingRate, TaxRule, TaxSummary, TaxType,
    };
}
