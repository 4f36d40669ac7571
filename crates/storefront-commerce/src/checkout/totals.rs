//! Final order totals.

use crate::checkout::{TaxLine, TaxSummary};
use crate::money::{round_money, Currency, Money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rounded totals for an order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub discount_total: Decimal,
    pub shipping_cost: Decimal,
    pub tax_total: Decimal,
    #[serde(default)]
    pub tax_breakdown: BTreeMap<String, TaxLine>,
    pub total: Decimal,
    pub currency: Currency,
}

impl OrderTotals {
    pub fn subtotal_money(&self) -> Money {
        Money::new(self.subtotal, self.currency)
    }

    pub fn discount_money(&self) -> Money {
        Money::new(self.discount_total, self.currency)
    }

    pub fn shipping_money(&self) -> Money {
        Money::new(self.shipping_cost, self.currency)
    }

    pub fn tax_money(&self) -> Money {
        Money::new(self.tax_total, self.currency)
    }

    pub fn total_money(&self) -> Money {
        Money::new(self.total, self.currency)
    }
}

/// Aggregate the parts of an order into its totals.
///
/// The grand total is computed from the unrounded inputs and floored at zero;
/// every amount is rounded to cents only on the way out.
pub fn aggregate_totals(
    subtotal: Decimal,
    discount_total: Decimal,
    shipping_cost: Decimal,
    taxes: &TaxSummary,
    currency: Currency,
) -> OrderTotals {
    let total = (subtotal + shipping_cost + taxes.total - discount_total).max(Decimal::ZERO);

    let tax_breakdown = taxes
        .breakdown
        .iter()
        .map(|(code, line)| {
            let mut line = line.clone();
            line.amount = round_money(line.amount);
            (code.clone(), line)
        })
        .collect();

    OrderTotals {
        subtotal: round_money(subtotal),
        discount_total: round_money(discount_total),
        shipping_cost: round_money(shipping_cost),
        tax_total: round_money(taxes.total),
        tax_breakdown,
        total: round_money(total),
        currency,
    }
}
