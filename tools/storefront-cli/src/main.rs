//! Storefront CLI - price checkouts from JSON fixtures.
//!
//! Commands:
//! - `storefront quote` - Reconcile a cart, apply a coupon and print the totals
//! - `storefront price` - Resolve the display price of one product or variant

mod commands;
mod context;
mod fixture;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{PriceArgs, QuoteArgs};

/// Storefront CLI - checkout pricing and discount resolution
#[derive(Parser)]
#[command(name = "storefront")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Engine config file (TOML), defaults to $STOREFRONT_CONFIG
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Price a checkout fixture
    Quote(QuoteArgs),

    /// Resolve the display price of a product
    Price(PriceArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "storefront=debug,storefront_commerce=debug"
    } else {
        "storefront=info,storefront_commerce=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let output = output::Output::new(cli.verbose, cli.json);
    let ctx = context::Context::load(cli.config.as_deref(), output)?;

    let result = match cli.command {
        Commands::Quote(args) => commands::quote::run(args, &ctx).await,
        Commands::Price(args) => commands::price::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
