//! Commerce error types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// How the storefront should react to a failure.
///
/// Nothing in the engine is fatal: every kind is recoverable by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input; shown inline next to the offending field.
    Validation,
    /// Coupon or discount scope/threshold not met; the user may retry.
    Ineligible,
    /// The coupon or product no longer exists; remove it and continue.
    NotFound,
    /// The backing store was unavailable; retry later, state is preserved.
    TransientFetch,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Ineligible => "ineligible",
            ErrorKind::NotFound => "not_found",
            ErrorKind::TransientFetch => "transient_fetch",
        }
    }
}

/// Errors that can occur in checkout pricing operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommerceError {
    /// No coupon code was entered.
    #[error("Coupon code is empty")]
    EmptyCouponCode,

    /// Invalid quantity.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// Quantity exceeds maximum allowed.
    #[error("Quantity {0} exceeds maximum allowed ({1})")]
    QuantityExceedsLimit(i64, i64),

    /// A variant's attribute combination does not cover its siblings' keys.
    #[error("Variant {variant_id} is missing attributes: {missing}")]
    IncompleteVariant { variant_id: String, missing: String },

    /// An order cannot be placed for an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Configuration could not be parsed.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Coupon code not found for this store.
    #[error("Coupon not found: {0}")]
    CouponNotFound(String),

    /// Product not found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Variant not found.
    #[error("Variant not found: {0}")]
    VariantNotFound(String),

    /// Item not in cart.
    #[error("Item not in cart: {0}")]
    ItemNotInCart(String),

    /// No stock left to cover any quantity of the item.
    #[error("Out of stock: {0}")]
    OutOfStock(String),

    /// Coupon has been switched off by the merchant.
    #[error("Coupon is not active: {0}")]
    CouponInactive(String),

    /// Coupon activation window has not opened yet.
    #[error("Coupon is not yet valid: {0}")]
    CouponNotStarted(String),

    /// Coupon activation window has closed.
    #[error("Coupon expired: {0}")]
    CouponExpired(String),

    /// Coupon usage limit reached.
    #[error("Coupon usage limit reached: {0}")]
    CouponUsageLimitReached(String),

    /// Cart subtotal is below the coupon's minimum order value.
    #[error("Coupon {code} requires a minimum order of {minimum}, cart subtotal is {subtotal}")]
    MinimumOrderNotMet {
        code: String,
        minimum: Decimal,
        subtotal: Decimal,
    },

    /// No cart line falls within the coupon's scope.
    #[error("Coupon {0} does not apply to any item in the cart")]
    CouponScopeMismatch(String),

    /// A backend request did not finish in time.
    #[error("{operation} timed out after {timeout:?}")]
    FetchTimeout {
        operation: &'static str,
        timeout: Duration,
    },

    /// A backend request failed.
    #[error("Backend unavailable: {0}")]
    Backend(String),

    /// Cache error.
    #[error("Cache error: {0}")]
    CacheError(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl CommerceError {
    /// Classify this error for the storefront.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CommerceError::EmptyCouponCode
            | CommerceError::InvalidQuantity(_)
            | CommerceError::QuantityExceedsLimit(..)
            | CommerceError::IncompleteVariant { .. }
            | CommerceError::EmptyCart
            | CommerceError::Config(_)
            | CommerceError::SerializationError(_) => ErrorKind::Validation,
            CommerceError::CouponNotFound(_)
            | CommerceError::ProductNotFound(_)
            | CommerceError::VariantNotFound(_)
            | CommerceError::ItemNotInCart(_) => ErrorKind::NotFound,
            CommerceError::OutOfStock(_)
            | CommerceError::CouponInactive(_)
            | CommerceError::CouponNotStarted(_)
            | CommerceError::CouponExpired(_)
            | CommerceError::CouponUsageLimitReached(_)
            | CommerceError::MinimumOrderNotMet { .. }
            | CommerceError::CouponScopeMismatch(_) => ErrorKind::Ineligible,
            CommerceError::FetchTimeout { .. }
            | CommerceError::Backend(_)
            | CommerceError::CacheError(_) => ErrorKind::TransientFetch,
        }
    }

    /// Whether retrying the same operation later may succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::TransientFetch
    }
}

#[cfg(feature = "storage")]
impl From<storefront_cache::CacheError> for CommerceError {
    fn from(e: storefront_cache::CacheError) -> Self {
        CommerceError::CacheError(e.to_string())
    }
}

impl From<serde_json::Error> for CommerceError {
    fn from(e: serde_json::Error) -> Self {
        CommerceError::SerializationError(e.to_string())
    }
}

impl From<toml::de::Error> for CommerceError {
    fn from(e: toml::de::Error) -> Self {
        CommerceError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(CommerceError::EmptyCouponCode.kind(), ErrorKind::Validation);
        assert_eq!(
            CommerceError::CouponNotFound("X".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            CommerceError::CouponScopeMismatch("X".into()).kind(),
            ErrorKind::Ineligible
        );
        assert_eq!(
            CommerceError::OutOfStock("mug".into()).kind(),
            ErrorKind::Ineligible
        );
        assert_eq!(
            CommerceError::Backend("down".into()).kind(),
            ErrorKind::TransientFetch
        );
    }

    #[test]
    fn test_only_transient_errors_are_retryable() {
        let timeout = CommerceError::FetchTimeout {
            operation: "catalog snapshot",
            timeout: Duration::from_millis(10),
        };
        assert!(timeout.is_retryable());
        assert!(!CommerceError::CouponExpired("X".into()).is_retryable());
    }

    #[test]
    fn test_minimum_order_message() {
        let err = CommerceError::MinimumOrderNotMet {
            code: "SAVE20".into(),
            minimum: Decimal::new(50, 0),
            subtotal: Decimal::new(4999, 2),
        };
        assert_eq!(
            err.to_string(),
            "Coupon SAVE20 requires a minimum order of 50, cart subtotal is 49.99"
        );
    }
}
