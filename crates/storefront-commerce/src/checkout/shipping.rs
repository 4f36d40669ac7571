//! Shipping rate types.

use crate::ids::ShippingRateId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A shipping option offered at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShippingRate {
    /// Unique identifier.
    pub id: ShippingRateId,
    /// Display name.
    pub name: String,
    /// Base cost per order.
    pub cost: Decimal,
    /// Whether cash on delivery can be chosen with this rate.
    #[serde(default)]
    pub cod_eligible: bool,
    /// Additional charge per unit shipped.
    #[serde(default)]
    pub per_item: Option<Decimal>,
}

impl ShippingRate {
    /// Create a new flat shipping rate.
    pub fn new(id: impl Into<ShippingRateId>, name: impl Into<String>, cost: Decimal) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            cost,
            cod_eligible: false,
            per_item: None,
        }
    }

    /// Add a per-unit charge.
    pub fn with_per_item(mut self, per_item: Decimal) -> Self {
        self.per_item = Some(per_item);
        self
    }

    /// Shipping cost for `units` units, unrounded.
    pub fn cost_for(&self, units: u32) -> Decimal {
        let per_item = self.per_item.unwrap_or(Decimal::ZERO) * Decimal::from(units);
        (self.cost + per_item).max(Decimal::ZERO)
    }

    /// Check if this is free shipping.
    pub fn is_free(&self) -> bool {
        self.cost.is_zero() && self.per_item.map_or(true, |p| p.is_zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_flat_rate() {
        let rate = ShippingRate::new("std", "Standard", dec!(4.99));
        assert_eq!(rate.cost_for(0), dec!(4.99));
        assert_eq!(rate.cost_for(7), dec!(4.99));
        assert!(!rate.is_free());
    }

    #[test]
    fn test_per_item_rate() {
        let rate = ShippingRate::new("bulk", "Bulk", dec!(3)).with_per_item(dec!(0.5));
        assert_eq!(rate.cost_for(4), dec!(5));
    }

    #[test]
    fn test_free_rate() {
        let rate = ShippingRate::new("free", "Free", Decimal::ZERO);
        assert!(rate.is_free());
        assert_eq!(rate.cost_for(3), Decimal::ZERO);
    }
}
