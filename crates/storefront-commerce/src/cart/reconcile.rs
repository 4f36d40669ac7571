//! Cart reconciliation against the live catalog.
//!
//! A persisted cart is only a convenience copy: prices, names and stock may
//! have changed since the lines were added. Reconciliation re-derives every
//! line from one catalog snapshot and reports what changed.

use crate::cart::{Cart, CartLine};
use crate::catalog::{CatalogSnapshot, CatalogSource};
use crate::error::CommerceError;
use crate::ids::{ProductId, VariantId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Why a line was dropped during reconciliation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    /// The product no longer exists.
    ProductMissing,
    /// The referenced variant no longer exists.
    VariantMissing,
    /// No units left.
    OutOfStock,
}

/// A line dropped during reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemovedLine {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub name: String,
    pub reason: RemovalReason,
}

/// A line whose unit price changed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RepricedLine {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub previous_price: Decimal,
    pub unit_price: Decimal,
}

/// A line whose quantity was lowered to the available stock.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClampedLine {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub requested: u32,
    pub available: u32,
}

/// Result of a reconciliation pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReconcileReport {
    /// The reconciled cart.
    pub cart: Cart,
    #[serde(default)]
    pub removed: Vec<RemovedLine>,
    #[serde(default)]
    pub repriced: Vec<RepricedLine>,
    #[serde(default)]
    pub clamped: Vec<ClampedLine>,
}

impl ReconcileReport {
    /// Whether the pass changed anything.
    pub fn has_changes(&self) -> bool {
        !self.removed.is_empty() || !self.repriced.is_empty() || !self.clamped.is_empty()
    }
}

/// Re-derive every cart line from the live catalog.
///
/// Issues a single snapshot request bounded by `timeout`. On failure the
/// input cart is left as it was and a transient error is returned.
pub async fn reconcile_cart<S>(
    cart: &Cart,
    source: &S,
    timeout: Duration,
    now: DateTime<Utc>,
) -> Result<ReconcileReport, CommerceError>
where
    S: CatalogSource + ?Sized,
{
    if cart.is_empty() {
        return Ok(ReconcileReport {
            cart: cart.clone(),
            removed: Vec::new(),
            repriced: Vec::new(),
            clamped: Vec::new(),
        });
    }

    let product_ids = cart.product_ids();
    let snapshot = match tokio::time::timeout(timeout, source.snapshot(&cart.store_id, &product_ids)).await {
        Ok(Ok(snapshot)) => snapshot,
        Ok(Err(e)) => {
            tracing::warn!(store = %cart.store_id, error = %e, "catalog snapshot failed");
            return Err(e);
        }
        Err(_) => {
            tracing::warn!(store = %cart.store_id, ?timeout, "catalog snapshot timed out");
            return Err(CommerceError::FetchTimeout {
                operation: "catalog snapshot",
                timeout,
            });
        }
    };

    let report = apply_snapshot(cart, &snapshot, now);
    tracing::info!(
        store = %cart.store_id,
        lines = report.cart.lines.len(),
        removed = report.removed.len(),
        repriced = report.repriced.len(),
        clamped = report.clamped.len(),
        "cart reconciled"
    );
    Ok(report)
}

fn apply_snapshot(cart: &Cart, snapshot: &CatalogSnapshot, now: DateTime<Utc>) -> ReconcileReport {
    let mut lines = Vec::with_capacity(cart.lines.len());
    let mut removed = Vec::new();
    let mut repriced = Vec::new();
    let mut clamped = Vec::new();

    for line in &cart.lines {
        let removal = |reason| RemovedLine {
            product_id: line.product_id.clone(),
            variant_id: line.variant_id.clone(),
            name: line.name.clone(),
            reason,
        };

        let Some(product) = snapshot.product(&line.product_id) else {
            tracing::warn!(product = %line.product_id, "dropping line, product missing");
            removed.push(removal(RemovalReason::ProductMissing));
            continue;
        };

        let variant = match &line.variant_id {
            Some(variant_id) => match product.variant(variant_id) {
                Some(variant) => Some(variant),
                None => {
                    tracing::warn!(product = %line.product_id, variant = %variant_id, "dropping line, variant missing");
                    removed.push(removal(RemovalReason::VariantMissing));
                    continue;
                }
            },
            None => None,
        };

        let available = product.stock_for(variant);
        if available == 0 {
            tracing::warn!(product = %line.product_id, "dropping line, out of stock");
            removed.push(removal(RemovalReason::OutOfStock));
            continue;
        }

        let mut fresh = CartLine::from_product(
            product,
            variant,
            line.quantity,
            &snapshot.discount_rules,
            now,
        );

        if line.quantity > available {
            clamped.push(ClampedLine {
                product_id: line.product_id.clone(),
                variant_id: line.variant_id.clone(),
                requested: line.quantity,
                available,
            });
            fresh.quantity = available;
        }

        if fresh.unit_price != line.unit_price {
            repriced.push(RepricedLine {
                product_id: line.product_id.clone(),
                variant_id: line.variant_id.clone(),
                previous_price: line.unit_price,
                unit_price: fresh.unit_price,
            });
        }

        lines.push(fresh);
    }

    ReconcileReport {
        cart: Cart {
            store_id: cart.store_id.clone(),
            currency: cart.currency,
            lines,
        },
        removed,
        repriced,
        clamped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::{ActiveWindow, Applicability, DiscountRule, DiscountValue};
    use crate::catalog::{InMemoryCatalog, Product, ProductVariant};
    use crate::error::ErrorKind;
    use crate::ids::DiscountId;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    const TIMEOUT: Duration = Duration::from_millis(500);

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 8, 0, 0).unwrap()
    }

    fn hoodie() -> Product {
        let mut product = Product::new("hoodie", "Hoodie", dec!(60));
        product.stock = 10;
        let mut small = ProductVariant::new("hoodie-s", product.id.clone(), dec!(55))
            .with_attribute("size", "S");
        small.stock = 2;
        let mut large = ProductVariant::new("hoodie-l", product.id.clone(), Decimal::ZERO)
            .with_attribute("size", "L");
        large.inherits_price = true;
        large.stock = 0;
        product.variants = vec![small, large];
        product
    }

    fn cap() -> Product {
        let mut product = Product::new("cap", "Cap", dec!(18));
        product.stock = 50;
        product
    }

    fn stale_cart() -> Cart {
        let mut cart = Cart::new("store-1");
        cart.lines = vec![
            CartLine::new("hoodie", "Hoodie", dec!(49), 3).with_variant("hoodie-s"),
            CartLine::new("hoodie", "Hoodie", dec!(60), 1).with_variant("hoodie-l"),
            CartLine::new("hoodie", "Hoodie", dec!(60), 1).with_variant("hoodie-xl"),
            CartLine::new("cap", "Cap", dec!(18), 2),
            CartLine::new("gone", "Gone", dec!(5), 1),
        ];
        cart
    }

    #[tokio::test]
    async fn test_reconcile_drops_reprices_and_clamps() {
        let catalog = InMemoryCatalog::new(vec![hoodie(), cap()], Vec::new());

        let report = reconcile_cart(&stale_cart(), &catalog, TIMEOUT, now())
            .await
            .unwrap();

        let reasons: Vec<RemovalReason> = report.removed.iter().map(|r| r.reason).collect();
        assert_eq!(
            reasons,
            vec![
                RemovalReason::OutOfStock,
                RemovalReason::VariantMissing,
                RemovalReason::ProductMissing,
            ]
        );

        assert_eq!(report.cart.lines.len(), 2);
        let small = &report.cart.lines[0];
        assert_eq!(small.unit_price, dec!(55));
        assert_eq!(small.quantity, 2);
        assert_eq!(small.max_stock, Some(2));
        assert_eq!(small.name, "Hoodie - S");

        assert_eq!(report.repriced.len(), 1);
        assert_eq!(report.repriced[0].previous_price, dec!(49));
        assert_eq!(report.clamped.len(), 1);
        assert_eq!(report.clamped[0].available, 2);
        assert!(report.has_changes());
    }

    #[tokio::test]
    async fn test_reconcile_applies_live_rules() {
        let rule = DiscountRule {
            id: DiscountId::new("caps"),
            name: "Cap week".to_string(),
            active: true,
            window: ActiveWindow::default(),
            applies_to: Applicability::SpecificProducts {
                product_ids: vec![ProductId::new("cap")],
            },
            discount: DiscountValue::FixedAmount(dec!(3)),
            min_order_value: None,
            created_at: now(),
        };
        let catalog = InMemoryCatalog::new(vec![cap()], vec![rule]);
        let mut cart = Cart::new("store-1");
        cart.lines.push(CartLine::new("cap", "Cap", dec!(18), 1));

        let report = reconcile_cart(&cart, &catalog, TIMEOUT, now()).await.unwrap();
        let line = &report.cart.lines[0];
        assert_eq!(line.unit_price, dec!(15));
        assert_eq!(line.compare_at_price, Some(dec!(18)));
    }

    #[tokio::test]
    async fn test_reconcile_twice_is_identical() {
        let catalog = InMemoryCatalog::new(vec![hoodie(), cap()], Vec::new());

        let first = reconcile_cart(&stale_cart(), &catalog, TIMEOUT, now())
            .await
            .unwrap();
        let second = reconcile_cart(&first.cart, &catalog, TIMEOUT, now())
            .await
            .unwrap();

        assert_eq!(
            serde_json::to_string(&first.cart).unwrap(),
            serde_json::to_string(&second.cart).unwrap()
        );
        assert!(!second.has_changes());
    }

    #[tokio::test]
    async fn test_reconcile_backend_failure_is_transient() {
        let catalog = InMemoryCatalog::new(vec![cap()], Vec::new()).with_failure("503");
        let cart = stale_cart();

        let err = reconcile_cart(&cart, &catalog, TIMEOUT, now())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransientFetch);
        assert_eq!(cart.lines.len(), 5);
    }

    #[tokio::test]
    async fn test_reconcile_timeout() {
        let catalog = InMemoryCatalog::new(vec![cap()], Vec::new())
            .with_latency(Duration::from_millis(200));

        let err = reconcile_cart(&stale_cart(), &catalog, Duration::from_millis(10), now())
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::FetchTimeout { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_reconcile_empty_cart_skips_fetch() {
        let catalog = InMemoryCatalog::default().with_failure("unreachable");
        let report = reconcile_cart(&Cart::new("store-1"), &catalog, TIMEOUT, now())
            .await
            .unwrap();
        assert!(report.cart.is_empty());
    }
}
