//! Tax rules and tax calculation.

use crate::cart::Cart;
use crate::ids::TaxRuleId;
use crate::money::percent_of;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Countries a tax rule applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CountryScope {
    /// Every country.
    All,
    /// A single country, matched by name ignoring case.
    Country(String),
}

impl CountryScope {
    /// A blank `country` means none was chosen and only matches `All`.
    pub fn matches(&self, country: &str) -> bool {
        let country = country.trim();
        match self {
            CountryScope::All => true,
            CountryScope::Country(_) if country.is_empty() => false,
            CountryScope::Country(name) => name.trim().eq_ignore_ascii_case(country),
        }
    }
}

impl From<String> for CountryScope {
    fn from(value: String) -> Self {
        if value.trim().eq_ignore_ascii_case("all") {
            CountryScope::All
        } else {
            CountryScope::Country(value)
        }
    }
}

impl From<CountryScope> for String {
    fn from(scope: CountryScope) -> Self {
        match scope {
            CountryScope::All => "All".to_string(),
            CountryScope::Country(name) => name,
        }
    }
}

impl fmt::Display for CountryScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountryScope::All => write!(f, "All"),
            CountryScope::Country(name) => write!(f, "{}", name),
        }
    }
}

/// How a tax rule's rate is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxType {
    /// Percent of the cart subtotal.
    Percentage,
    /// Fixed amount, once per order or per unit.
    Fixed,
}

/// A tax configured by the merchant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaxRule {
    pub id: TaxRuleId,
    pub active: bool,
    pub country: CountryScope,
    /// Key of the breakdown entry; rules sharing a code accumulate.
    pub code: String,
    pub label: String,
    pub tax_type: TaxType,
    /// Percent for percentage rules, amount for fixed ones.
    pub rate: Decimal,
    /// Charge a fixed rule once per unit instead of once per order.
    #[serde(default)]
    pub apply_per_item: bool,
}

/// One entry of the tax breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaxLine {
    pub label: String,
    pub amount: Decimal,
    pub rate: Decimal,
    pub tax_type: TaxType,
    /// Units the entry was charged on.
    pub count: u32,
    pub apply_per_item: bool,
}

/// Taxes for a cart, by code.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TaxSummary {
    pub breakdown: BTreeMap<String, TaxLine>,
    pub total: Decimal,
}

/// Compute the taxes owed on a cart shipped to `country`.
///
/// Pass an empty `country` when none is known; only `All` rules apply then.
pub fn compute_taxes(cart: &Cart, country: &str, rules: &[TaxRule]) -> TaxSummary {
    let subtotal = cart.subtotal();
    let units = cart.item_count();
    let mut breakdown: BTreeMap<String, TaxLine> = BTreeMap::new();

    for rule in rules.iter().filter(|r| r.active && r.country.matches(country)) {
        let (amount, count) = match (rule.tax_type, rule.apply_per_item) {
            (TaxType::Percentage, _) => (percent_of(subtotal, rule.rate), units),
            (TaxType::Fixed, true) => (rule.rate * Decimal::from(units), units),
            (TaxType::Fixed, false) => (rule.rate, 1),
        };

        breakdown
            .entry(rule.code.clone())
            .and_modify(|line| {
                line.amount += amount;
                line.count += count;
            })
            .or_insert_with(|| TaxLine {
                label: rule.label.clone(),
                amount,
                rate: rule.rate,
                tax_type: rule.tax_type,
                count,
                apply_per_item: rule.apply_per_item,
            });
    }

    let total = breakdown.values().map(|line| line.amount).sum();
    tracing::debug!(country, entries = breakdown.len(), %total, "taxes computed");
    TaxSummary { breakdown, total }
}
