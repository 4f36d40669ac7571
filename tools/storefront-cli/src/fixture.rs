//! Checkout fixtures read by the CLI.

use std::path::Path;

use anyhow::{Context as _, Result};
use serde::Deserialize;
use storefront_commerce::prelude::*;

/// Everything needed to price one checkout, as a JSON document.
#[derive(Debug, Clone, Deserialize)]
pub struct Fixture {
    pub store_id: StoreId,
    #[serde(default)]
    pub currency: Option<Currency>,
    /// Cart lines as persisted on the client.
    #[serde(default)]
    pub cart: Vec<CartLine>,
    /// Live catalog.
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub discount_rules: Vec<DiscountRule>,
    #[serde(default)]
    pub coupons: Vec<Coupon>,
    #[serde(default)]
    pub tax_rules: Vec<TaxRule>,
    #[serde(default)]
    pub shipping: Option<ShippingRate>,
    #[serde(default)]
    pub country: Option<String>,
}

impl Fixture {
    /// Read a fixture file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse fixture: {}", path.display()))
    }

    /// The persisted cart, in the fixture or configured currency.
    pub fn cart(&self, default_currency: Currency) -> Cart {
        let mut cart = Cart::new(self.store_id.clone())
            .with_currency(self.currency.unwrap_or(default_currency));
        cart.lines = self.cart.clone();
        cart
    }

    /// The live catalog the cart is reconciled against.
    pub fn catalog(&self) -> InMemoryCatalog {
        InMemoryCatalog::new(self.products.clone(), self.discount_rules.clone())
    }

    /// Coupons of the fixture's store.
    pub fn coupon_book(&self) -> InMemoryCouponBook {
        InMemoryCouponBook::new(self.coupons.clone())
    }
}
