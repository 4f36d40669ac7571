//! Monetary values.
//!
//! Every amount in the engine is a [`Decimal`] carried at full precision.
//! Rounding to cents happens once, when totals are aggregated, so that
//! percentage discounts, compounding and taxes never accumulate rounding
//! error across steps.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of decimal places every aggregated currency field is rounded to.
pub const CURRENCY_DECIMAL_PLACES: u32 = 2;

/// Supported currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Currency {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
    CHF,
    INR,
    MXN,
    EGP,
    SAR,
    AED,
}

impl Currency {
    /// Get the currency code (e.g., "USD").
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::CAD => "CAD",
            Currency::AUD => "AUD",
            Currency::CHF => "CHF",
            Currency::INR => "INR",
            Currency::MXN => "MXN",
            Currency::EGP => "EGP",
            Currency::SAR => "SAR",
            Currency::AED => "AED",
        }
    }

    /// Get the currency symbol (e.g., "$").
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::USD => "$",
            Currency::EUR => "\u{20ac}",
            Currency::GBP => "\u{00a3}",
            Currency::CAD => "CA$",
            Currency::AUD => "A$",
            Currency::CHF => "CHF ",
            Currency::INR => "\u{20b9}",
            Currency::MXN => "MX$",
            Currency::EGP => "E\u{00a3}",
            Currency::SAR => "SAR ",
            Currency::AED => "AED ",
        }
    }

    /// Parse a currency code string.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "USD" => Some(Currency::USD),
            "EUR" => Some(Currency::EUR),
            "GBP" => Some(Currency::GBP),
            "CAD" => Some(Currency::CAD),
            "AUD" => Some(Currency::AUD),
            "CHF" => Some(Currency::CHF),
            "INR" => Some(Currency::INR),
            "MXN" => Some(Currency::MXN),
            "EGP" => Some(Currency::EGP),
            "SAR" => Some(Currency::SAR),
            "AED" => Some(Currency::AED),
            _ => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Round an amount to cents, half away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(
        CURRENCY_DECIMAL_PLACES,
        RoundingStrategy::MidpointAwayFromZero,
    )
}

/// `percent`% of `amount`, unrounded.
pub fn percent_of(amount: Decimal, percent: Decimal) -> Decimal {
    amount * percent / Decimal::ONE_HUNDRED
}

/// A monetary value with currency, used for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Money {
    /// Amount in major units at full precision.
    pub amount: Decimal,
    /// The currency.
    pub currency: Currency,
}

impl Money {
    /// Create a new Money value.
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Create a Money value from minor units (cents).
    pub fn from_cents(cents: i64, currency: Currency) -> Self {
        Self::new(Decimal::new(cents, CURRENCY_DECIMAL_PLACES), currency)
    }

    /// Create a zero amount in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    /// Check if this is zero.
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// The amount rounded to cents.
    pub fn rounded(&self) -> Self {
        Self::new(round_money(self.amount), self.currency)
    }

    /// Format as a display string (e.g., "$49.99").
    pub fn display(&self) -> String {
        format!("{}{}", self.currency.symbol(), self.display_amount())
    }

    /// Format as a display string without symbol (e.g., "49.99").
    pub fn display_amount(&self) -> String {
        let places = CURRENCY_DECIMAL_PLACES as usize;
        format!("{:.places$}", round_money(self.amount))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}
