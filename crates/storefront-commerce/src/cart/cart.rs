//! Cart and cart line types.

use crate::cart::{resolve_price_at, DiscountRule};
use crate::catalog::{Product, ProductVariant};
use crate::error::CommerceError;
use crate::ids::{CategoryId, ProductId, StoreId, VariantId};
use crate::money::Currency;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Maximum quantity allowed per line.
pub const MAX_QUANTITY_PER_ITEM: i64 = 9999;

/// A shopping cart for one store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cart {
    /// Store context the cart belongs to.
    pub store_id: StoreId,
    /// Cart currency.
    #[serde(default)]
    pub currency: Currency,
    /// Lines in insertion order.
    #[serde(default)]
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart for a store.
    pub fn new(store_id: impl Into<StoreId>) -> Self {
        Self {
            store_id: store_id.into(),
            currency: Currency::default(),
            lines: Vec::new(),
        }
    }

    /// Set the cart currency.
    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    /// Add a line to the cart.
    ///
    /// A line for the same product and variant is merged by adding
    /// quantities. The resulting quantity is clamped to the line's stock
    /// ceiling; a ceiling of zero is rejected with `OutOfStock` and the cart
    /// is left untouched. Returns the quantity now in the cart.
    pub fn add_line(&mut self, line: CartLine) -> Result<u32, CommerceError> {
        validate_quantity(i64::from(line.quantity))?;

        if let Some(existing) = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == line.product_id && l.variant_id == line.variant_id)
        {
            let requested = i64::from(existing.quantity) + i64::from(line.quantity);
            validate_quantity(requested)?;
            let quantity = line.clamp_to_stock(requested as u32)?;
            existing.unit_price = line.unit_price;
            existing.compare_at_price = line.compare_at_price;
            existing.max_stock = line.max_stock;
            existing.quantity = quantity;
            return Ok(quantity);
        }

        let mut line = line;
        line.quantity = line.clamp_to_stock(line.quantity)?;
        let quantity = line.quantity;
        self.lines.push(line);
        Ok(quantity)
    }

    /// Update a line's quantity; zero removes the line.
    ///
    /// Returns `ItemNotInCart` if no such line exists and `OutOfStock` if
    /// its stock has run out.
    pub fn update_quantity(
        &mut self,
        product_id: &ProductId,
        variant_id: Option<&VariantId>,
        quantity: i64,
    ) -> Result<u32, CommerceError> {
        if quantity < 0 {
            return Err(CommerceError::InvalidQuantity(quantity));
        }
        if quantity == 0 {
            return if self.remove_line(product_id, variant_id) {
                Ok(0)
            } else {
                Err(CommerceError::ItemNotInCart(product_id.to_string()))
            };
        }
        validate_quantity(quantity)?;

        let line = self
            .lines
            .iter_mut()
            .find(|l| l.matches(product_id, variant_id))
            .ok_or_else(|| CommerceError::ItemNotInCart(product_id.to_string()))?;
        line.quantity = line.clamp_to_stock(quantity as u32)?;
        Ok(line.quantity)
    }

    /// Remove a line. Returns whether anything was removed.
    pub fn remove_line(&mut self, product_id: &ProductId, variant_id: Option<&VariantId>) -> bool {
        let len_before = self.lines.len();
        self.lines.retain(|l| !l.matches(product_id, variant_id));
        self.lines.len() < len_before
    }

    /// Remove all lines.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of unit price times quantity over all lines, unrounded.
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Total number of units.
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Check if cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Distinct product IDs referenced by the cart, in line order.
    pub fn product_ids(&self) -> Vec<ProductId> {
        let mut ids: Vec<ProductId> = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            if !ids.contains(&line.product_id) {
                ids.push(line.product_id.clone());
            }
        }
        ids
    }
}

fn validate_quantity(quantity: i64) -> Result<(), CommerceError> {
    if quantity < 1 {
        return Err(CommerceError::InvalidQuantity(quantity));
    }
    if quantity > MAX_QUANTITY_PER_ITEM {
        return Err(CommerceError::QuantityExceedsLimit(
            quantity,
            MAX_QUANTITY_PER_ITEM,
        ));
    }
    Ok(())
}

/// A line in the cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartLine {
    /// Product being purchased.
    pub product_id: ProductId,
    /// Variant being purchased, if the product has variants.
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    /// Category of the product, used for scope checks.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    /// Resolved display name.
    pub name: String,
    /// Resolved image URL.
    #[serde(default)]
    pub image: Option<String>,
    /// Price per unit after automatic item discounts.
    pub unit_price: Decimal,
    /// Struck-through anchor price per unit.
    #[serde(default)]
    pub compare_at_price: Option<Decimal>,
    /// Quantity, at least 1.
    pub quantity: u32,
    /// Units available; quantities are clamped to it.
    #[serde(default)]
    pub max_stock: Option<u32>,
}

impl CartLine {
    /// Create a line for a product.
    pub fn new(
        product_id: impl Into<ProductId>,
        name: impl Into<String>,
        unit_price: Decimal,
        quantity: u32,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            variant_id: None,
            category_id: None,
            name: name.into(),
            image: None,
            unit_price,
            compare_at_price: None,
            quantity,
            max_stock: None,
        }
    }

    /// Build a line from live catalog data, priced against the automatic
    /// discount rules at `now`.
    pub fn from_product(
        product: &Product,
        variant: Option<&ProductVariant>,
        quantity: u32,
        rules: &[DiscountRule],
        now: DateTime<Utc>,
    ) -> Self {
        let price = resolve_price_at(&product.priced_entity(variant), rules, now);
        Self {
            product_id: product.id.clone(),
            variant_id: variant.map(|v| v.id.clone()),
            category_id: product.category_id.clone(),
            name: product.display_name(variant),
            image: product.primary_image(variant),
            unit_price: price.final_price,
            compare_at_price: price.compare_at_price,
            quantity,
            max_stock: Some(product.stock_for(variant)),
        }
    }

    /// Set the variant.
    pub fn with_variant(mut self, variant_id: impl Into<VariantId>) -> Self {
        self.variant_id = Some(variant_id.into());
        self
    }

    /// Set the category.
    pub fn with_category(mut self, category_id: impl Into<CategoryId>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    /// Unit price times quantity, unrounded.
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    /// Whether this line is for the given product and variant.
    pub fn matches(&self, product_id: &ProductId, variant_id: Option<&VariantId>) -> bool {
        &self.product_id == product_id && self.variant_id.as_ref() == variant_id
    }

    /// The line carries a discount worth showing.
    pub fn is_discounted(&self) -> bool {
        self.compare_at_price
            .is_some_and(|compare| compare > self.unit_price)
    }

    fn clamp_to_stock(&self, quantity: u32) -> Result<u32, CommerceError> {
        match self.max_stock {
            Some(0) => Err(CommerceError::OutOfStock(self.product_id.to_string())),
            Some(ceiling) => Ok(quantity.min(ceiling)),
            None => Ok(quantity),
        }
    }
}
