//! CLI command implementations.

pub mod price;
pub mod quote;

use clap::Args;

/// Arguments for the quote command.
#[derive(Args)]
pub struct QuoteArgs {
    /// Checkout fixture (JSON).
    #[arg(short, long)]
    pub input: String,

    /// Coupon code to apply.
    #[arg(long)]
    pub coupon: Option<String>,

    /// Destination country for taxes.
    #[arg(long)]
    pub country: Option<String>,

    /// Place the order and record the coupon use.
    #[arg(long)]
    pub place: bool,
}

/// Arguments for the price command.
#[derive(Args)]
pub struct PriceArgs {
    /// Checkout fixture (JSON).
    #[arg(short, long)]
    pub input: String,

    /// Product ID.
    #[arg(short, long)]
    pub product: String,

    /// Variant ID.
    #[arg(long)]
    pub variant: Option<String>,
}
