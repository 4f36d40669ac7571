//! Coupon codes: lookup, validation and usage tracking.

use crate::cart::{ActiveWindow, Applicability, Cart, DiscountValue, WindowStatus};
use crate::error::CommerceError;
use crate::ids::{CouponId, OrderId, StoreId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

/// A coupon code a customer can enter at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Coupon {
    /// Unique coupon identifier.
    pub id: CouponId,
    /// Store the coupon belongs to.
    pub store_id: StoreId,
    /// Code as configured by the merchant; matched case-insensitively.
    pub code: String,
    pub active: bool,
    #[serde(default)]
    pub window: ActiveWindow,
    /// Maximum number of redemptions across all customers.
    #[serde(default)]
    pub usage_limit: Option<u32>,
    /// Redemptions so far.
    #[serde(default)]
    pub usage_count: u32,
    /// Minimum cart subtotal.
    #[serde(default)]
    pub min_order_value: Option<Decimal>,
    pub applies_to: Applicability,
    pub discount: DiscountValue,
}

impl Coupon {
    /// Create an active, unrestricted coupon.
    pub fn new(
        id: impl Into<CouponId>,
        store_id: impl Into<StoreId>,
        code: impl Into<String>,
        discount: DiscountValue,
    ) -> Self {
        Self {
            id: id.into(),
            store_id: store_id.into(),
            code: code.into(),
            active: true,
            window: ActiveWindow::default(),
            usage_limit: None,
            usage_count: 0,
            min_order_value: None,
            applies_to: Applicability::all(),
            discount,
        }
    }

    /// Whether the usage cap still allows a redemption.
    pub fn has_uses_left(&self) -> bool {
        self.usage_limit.map_or(true, |limit| self.usage_count < limit)
    }

    /// Whether the coupon's discount is recomputed on the remainder after
    /// the automatic order discount.
    pub fn compounds(&self) -> bool {
        self.discount.is_percentage() && self.applies_to.is_all()
    }
}

/// A coupon that passed validation, with its contribution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppliedCoupon {
    pub coupon: Coupon,
    /// Discount the coupon grants on its own, unrounded.
    pub discount_amount: Decimal,
    /// Subtotal of the cart lines in the coupon's scope.
    pub eligible_subtotal: Decimal,
}

impl AppliedCoupon {
    pub fn code(&self) -> &str {
        &self.coupon.code
    }
}

/// Looks up coupons by code.
#[async_trait]
pub trait CouponLookup: Send + Sync {
    /// Find the coupon with this code in the store, ignoring case.
    async fn find_by_code(
        &self,
        store_id: &StoreId,
        code: &str,
    ) -> Result<Option<Coupon>, CommerceError>;
}

/// Counts coupon redemptions when an order is placed.
#[async_trait]
pub trait CouponUsageRecorder: Send + Sync {
    /// Record one use of the coupon by the order.
    ///
    /// Recording the same (coupon, order) pair again has no effect. Returns
    /// whether a new use was counted.
    async fn record_usage(
        &self,
        coupon_id: &CouponId,
        order_id: &OrderId,
    ) -> Result<bool, CommerceError>;
}

/// Validate a coupon code for a cart.
///
/// The code is trimmed and looked up once, bounded by `timeout`. The coupon
/// is then checked by [`evaluate_coupon`].
pub async fn validate_coupon<L>(
    code: &str,
    cart: &Cart,
    subtotal: Decimal,
    lookup: &L,
    timeout: Duration,
    now: DateTime<Utc>,
) -> Result<AppliedCoupon, CommerceError>
where
    L: CouponLookup + ?Sized,
{
    let code = code.trim();
    if code.is_empty() {
        return Err(CommerceError::EmptyCouponCode);
    }

    let found = tokio::time::timeout(timeout, lookup.find_by_code(&cart.store_id, code))
        .await
        .map_err(|_| CommerceError::FetchTimeout {
            operation: "coupon lookup",
            timeout,
        })??;

    let coupon = found.ok_or_else(|| CommerceError::CouponNotFound(code.to_string()))?;
    let result = evaluate_coupon(&coupon, cart, subtotal, now);
    if let Err(e) = &result {
        tracing::warn!(code = %coupon.code, kind = e.kind().as_str(), error = %e, "coupon rejected");
    }
    result
}

/// Check a coupon against the cart and compute its discount.
///
/// Checks run in order and stop at the first failure: active flag, window,
/// usage cap, minimum order value, then scope.
pub fn evaluate_coupon(
    coupon: &Coupon,
    cart: &Cart,
    subtotal: Decimal,
    now: DateTime<Utc>,
) -> Result<AppliedCoupon, CommerceError> {
    let code = || coupon.code.clone();

    if !coupon.active {
        return Err(CommerceError::CouponInactive(code()));
    }
    match coupon.window.status(now) {
        WindowStatus::NotStarted => return Err(CommerceError::CouponNotStarted(code())),
        WindowStatus::Ended => return Err(CommerceError::CouponExpired(code())),
        WindowStatus::Open => {}
    }
    if !coupon.has_uses_left() {
        return Err(CommerceError::CouponUsageLimitReached(code()));
    }
    if let Some(minimum) = coupon.min_order_value {
        if subtotal < minimum {
            return Err(CommerceError::MinimumOrderNotMet {
                code: code(),
                minimum,
                subtotal,
            });
        }
    }

    let eligible: Vec<_> = cart
        .lines
        .iter()
        .filter(|line| {
            coupon
                .applies_to
                .applies_to(&line.product_id, line.category_id.as_ref())
        })
        .collect();
    if !cart.is_empty() && eligible.is_empty() {
        return Err(CommerceError::CouponScopeMismatch(code()));
    }

    let eligible_subtotal: Decimal = eligible.iter().map(|line| line.line_total()).sum();
    let discount_amount = match coupon.discount {
        DiscountValue::Percentage(_) => coupon.discount.savings_on(eligible_subtotal),
        DiscountValue::FixedAmount(value) => value,
    }
    .min(subtotal)
    .max(Decimal::ZERO);

    tracing::debug!(code = %coupon.code, %discount_amount, %eligible_subtotal, "coupon accepted");

    Ok(AppliedCoupon {
        coupon: coupon.clone(),
        discount_amount,
        eligible_subtotal,
    })
}

/// In-memory coupon book, used by tests and the CLI.
#[derive(Debug, Default)]
pub struct InMemoryCouponBook {
    coupons: Mutex<HashMap<(StoreId, String), Coupon>>,
    redemptions: Mutex<HashSet<(CouponId, OrderId)>>,
    latency: Option<Duration>,
}

impl InMemoryCouponBook {
    pub fn new(coupons: impl IntoIterator<Item = Coupon>) -> Self {
        let coupons = coupons
            .into_iter()
            .map(|coupon| (Self::key(&coupon.store_id, &coupon.code), coupon))
            .collect();
        Self {
            coupons: Mutex::new(coupons),
            ..Self::default()
        }
    }

    /// Delay every lookup by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Current state of a coupon, by ID.
    pub fn coupon(&self, coupon_id: &CouponId) -> Option<Coupon> {
        let map = self.coupons.lock().ok()?;
        map.values().find(|c| &c.id == coupon_id).cloned()
    }

    fn key(store_id: &StoreId, code: &str) -> (StoreId, String) {
        (store_id.clone(), code.trim().to_lowercase())
    }
}

#[async_trait]
impl CouponLookup for InMemoryCouponBook {
    async fn find_by_code(
        &self,
        store_id: &StoreId,
        code: &str,
    ) -> Result<Option<Coupon>, CommerceError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let map = self
            .coupons
            .lock()
            .map_err(|e| CommerceError::Backend(e.to_string()))?;
        Ok(map.get(&Self::key(store_id, code)).cloned())
    }
}

#[async_trait]
impl CouponUsageRecorder for InMemoryCouponBook {
    async fn record_usage(
        &self,
        coupon_id: &CouponId,
        order_id: &OrderId,
    ) -> Result<bool, CommerceError> {
        let mut map = self
            .coupons
            .lock()
            .map_err(|e| CommerceError::Backend(e.to_string()))?;
        let coupon = map
            .values_mut()
            .find(|c| &c.id == coupon_id)
            .ok_or_else(|| CommerceError::CouponNotFound(coupon_id.to_string()))?;

        let mut redemptions = self
            .redemptions
            .lock()
            .map_err(|e| CommerceError::Backend(e.to_string()))?;
        if !redemptions.insert((coupon_id.clone(), order_id.clone())) {
            return Ok(false);
        }
        coupon.usage_count += 1;
        tracing::info!(coupon = %coupon_id, order = %order_id, uses = coupon.usage_count, "coupon usage recorded");
        Ok(true)
    }
}
