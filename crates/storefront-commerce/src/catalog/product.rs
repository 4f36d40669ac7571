//! Product and variant types.

use crate::cart::PricedEntity;
use crate::error::CommerceError;
use crate::ids::{CategoryId, ProductId, VariantId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A product in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    /// Unique product identifier.
    pub id: ProductId,
    /// Category this product belongs to.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    /// Product name.
    pub name: String,
    /// Image URLs, first one is the primary image.
    #[serde(default)]
    pub images: Vec<String>,
    /// Base price.
    pub price: Decimal,
    /// Base compare-at price.
    #[serde(default)]
    pub compare_at_price: Option<Decimal>,
    /// Units in stock (for products without variants).
    #[serde(default)]
    pub stock: u32,
    /// Purchasable variants, empty for simple products.
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
}

impl Product {
    /// Create a new simple product.
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: id.into(),
            category_id: None,
            name: name.into(),
            images: Vec::new(),
            price,
            compare_at_price: None,
            stock: 0,
            variants: Vec::new(),
        }
    }

    /// Check if this product has variants.
    pub fn has_variants(&self) -> bool {
        !self.variants.is_empty()
    }

    /// Find a variant by ID.
    pub fn variant(&self, variant_id: &VariantId) -> Option<&ProductVariant> {
        self.variants.iter().find(|v| &v.id == variant_id)
    }

    /// The entity the price resolver works on, for the product itself or one
    /// of its variants.
    pub fn priced_entity(&self, variant: Option<&ProductVariant>) -> PricedEntity {
        let (price, compare_at_price) = match variant {
            Some(v) => (v.effective_price(self), v.effective_compare_at_price(self)),
            None => (self.price, self.compare_at_price),
        };
        PricedEntity {
            product_id: self.id.clone(),
            category_id: self.category_id.clone(),
            price,
            compare_at_price,
        }
    }

    /// Units available for the product or the given variant.
    pub fn stock_for(&self, variant: Option<&ProductVariant>) -> u32 {
        variant.map(|v| v.stock).unwrap_or(self.stock)
    }

    /// Display name, suffixed with the variant label when there is one.
    pub fn display_name(&self, variant: Option<&ProductVariant>) -> String {
        match variant {
            Some(v) if !v.combination.is_empty() => format!("{} - {}", self.name, v.label()),
            _ => self.name.clone(),
        }
    }

    /// Primary image, preferring the variant's own images.
    pub fn primary_image(&self, variant: Option<&ProductVariant>) -> Option<String> {
        variant
            .and_then(|v| v.images.first())
            .or_else(|| self.images.first())
            .cloned()
    }

    /// Check that every variant assigns a value to every attribute key used
    /// by any of its siblings.
    pub fn validate_variants(&self) -> Result<(), CommerceError> {
        let keys: BTreeSet<&str> = self
            .variants
            .iter()
            .flat_map(|v| v.combination.keys().map(String::as_str))
            .collect();

        for variant in &self.variants {
            let missing: Vec<&str> = keys
                .iter()
                .copied()
                .filter(|k| !variant.combination.contains_key(*k))
                .collect();
            if !missing.is_empty() {
                return Err(CommerceError::IncompleteVariant {
                    variant_id: variant.id.to_string(),
                    missing: missing.join(", "),
                });
            }
        }
        Ok(())
    }
}

/// A product variant (e.g., size/color combination).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductVariant {
    /// Unique variant identifier.
    pub id: VariantId,
    /// Parent product ID.
    pub product_id: ProductId,
    /// Attribute key to value, e.g. `Size -> Large`.
    #[serde(default)]
    pub combination: BTreeMap<String, String>,
    /// Own price, ignored when `inherits_price` is set.
    #[serde(default)]
    pub price: Decimal,
    /// Use the parent product's base price instead of `price`.
    #[serde(default)]
    pub inherits_price: bool,
    /// Own compare-at price.
    #[serde(default)]
    pub compare_at_price: Option<Decimal>,
    /// Units in stock.
    #[serde(default)]
    pub stock: u32,
    /// Image URLs for this variant.
    #[serde(default)]
    pub images: Vec<String>,
}

impl ProductVariant {
    /// Create a new variant with its own price.
    pub fn new(id: impl Into<VariantId>, product_id: ProductId, price: Decimal) -> Self {
        Self {
            id: id.into(),
            product_id,
            combination: BTreeMap::new(),
            price,
            inherits_price: false,
            compare_at_price: None,
            stock: 0,
            images: Vec::new(),
        }
    }

    /// Unit price, honoring price inheritance.
    pub fn effective_price(&self, product: &Product) -> Decimal {
        if self.inherits_price {
            product.price
        } else {
            self.price
        }
    }

    /// Compare-at price; an inheriting variant falls back to the product's.
    pub fn effective_compare_at_price(&self, product: &Product) -> Option<Decimal> {
        if self.inherits_price {
            self.compare_at_price.or(product.compare_at_price)
        } else {
            self.compare_at_price
        }
    }

    /// Label built from the attribute values, e.g. "Blue / Large".
    pub fn label(&self) -> String {
        if self.combination.is_empty() {
            "Default".to_string()
        } else {
            self.combination
                .values()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(" / ")
        }
    }

    /// Set one attribute of the combination.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.combination.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tee() -> Product {
        let mut product = Product::new("tee", "Tee", dec!(20));
        product.compare_at_price = Some(dec!(25));
        product.images = vec!["tee.png".into()];
        product
    }

    #[test]
    fn test_variant_inherits_base_price() {
        let product = tee();
        let mut variant = ProductVariant::new("tee-l", product.id.clone(), dec!(99));
        variant.inherits_price = true;

        assert_eq!(variant.effective_price(&product), dec!(20));
        assert_eq!(variant.effective_compare_at_price(&product), Some(dec!(25)));
    }

    #[test]
    fn test_variant_own_price() {
        let product = tee();
        let variant = ProductVariant::new("tee-l", product.id.clone(), dec!(22));

        let entity = product.priced_entity(Some(&variant));
        assert_eq!(entity.price, dec!(22));
        assert_eq!(entity.compare_at_price, None);
    }

    #[test]
    fn test_display_name_and_image() {
        let mut product = tee();
        let mut variant = ProductVariant::new("tee-l", product.id.clone(), dec!(22))
            .with_attribute("Size", "Large")
            .with_attribute("Color", "Blue");
        assert_eq!(product.display_name(Some(&variant)), "Tee - Blue / Large");
        assert_eq!(product.primary_image(Some(&variant)), Some("tee.png".into()));

        variant.images = vec!["tee-blue.png".into()];
        product.variants.push(variant.clone());
        assert_eq!(
            product.primary_image(Some(&variant)),
            Some("tee-blue.png".into())
        );
        assert_eq!(product.display_name(None), "Tee");
    }

    #[test]
    fn test_validate_variants_total_assignment() {
        let mut product = tee();
        let id = product.id.clone();
        product.variants = vec![
            ProductVariant::new("a", id.clone(), dec!(1))
                .with_attribute("Size", "S")
                .with_attribute("Color", "Red"),
            ProductVariant::new("b", id.clone(), dec!(1))
                .with_attribute("Size", "M")
                .with_attribute("Color", "Red"),
        ];
        assert!(product.validate_variants().is_ok());

        product
            .variants
            .push(ProductVariant::new("c", id, dec!(1)).with_attribute("Size", "L"));
        let err = product.validate_variants().unwrap_err();
        assert_eq!(
            err,
            CommerceError::IncompleteVariant {
                variant_id: "c".into(),
                missing: "Color".into(),
            }
        );
    }
}
