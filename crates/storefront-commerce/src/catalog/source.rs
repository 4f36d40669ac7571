//! Live catalog access for cart reconciliation.

use crate::cart::DiscountRule;
use crate::catalog::Product;
use crate::error::CommerceError;
use crate::ids::{ProductId, StoreId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

/// Authoritative catalog and discount state for one reconciliation pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CatalogSnapshot {
    /// Products that still exist, with their variants.
    #[serde(default)]
    pub products: Vec<Product>,
    /// Discount rules currently configured for the store.
    #[serde(default)]
    pub discount_rules: Vec<DiscountRule>,
}

impl CatalogSnapshot {
    /// Find a product by ID.
    pub fn product(&self, product_id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == product_id)
    }
}

/// Backing store the reconciler queries for live catalog data.
///
/// Implementations issue a single request per call; the caller bounds it
/// with a timeout.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch the given products and the store's discount rules.
    async fn snapshot(
        &self,
        store_id: &StoreId,
        product_ids: &[ProductId],
    ) -> Result<CatalogSnapshot, CommerceError>;
}

/// In-memory catalog, used by tests and the CLI.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    products: BTreeMap<ProductId, Product>,
    discount_rules: Vec<DiscountRule>,
    latency: Option<Duration>,
    failure: Option<String>,
}

impl InMemoryCatalog {
    /// Create a catalog from products and rules.
    pub fn new(products: Vec<Product>, discount_rules: Vec<DiscountRule>) -> Self {
        Self {
            products: products.into_iter().map(|p| (p.id.clone(), p)).collect(),
            discount_rules,
            latency: None,
            failure: None,
        }
    }

    /// Delay every snapshot by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail every snapshot with a backend error.
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Insert or replace a product.
    pub fn upsert_product(&mut self, product: Product) {
        self.products.insert(product.id.clone(), product);
    }

    /// Remove a product.
    pub fn remove_product(&mut self, product_id: &ProductId) -> Option<Product> {
        self.products.remove(product_id)
    }

    /// Replace the discount rules.
    pub fn set_discount_rules(&mut self, rules: Vec<DiscountRule>) {
        self.discount_rules = rules;
    }
}

#[async_trait]
impl CatalogSource for InMemoryCatalog {
    async fn snapshot(
        &self,
        _store_id: &StoreId,
        product_ids: &[ProductId],
    ) -> Result<CatalogSnapshot, CommerceError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(message) = &self.failure {
            return Err(CommerceError::Backend(message.clone()));
        }

        let mut seen = BTreeSet::new();
        let products = product_ids
            .iter()
            .filter(|id| seen.insert(*id))
            .filter_map(|id| self.products.get(id).cloned())
            .collect();

        Ok(CatalogSnapshot {
            products,
            discount_rules: self.discount_rules.clone(),
        })
    }
}
