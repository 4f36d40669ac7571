//! Display price of a single product or variant.

use anyhow::Result;
use chrono::Utc;
use storefront_commerce::prelude::*;

use super::PriceArgs;
use crate::context::Context;
use crate::fixture::Fixture;
use crate::output::strike;

/// Run the price command.
pub async fn run(args: PriceArgs, ctx: &Context) -> Result<()> {
    let fixture = Fixture::load(&ctx.resolve_path(&args.input))?;
    let currency = fixture.currency.unwrap_or(ctx.config.currency);

    let product_id = ProductId::new(args.product);
    let product = fixture
        .products
        .iter()
        .find(|p| p.id == product_id)
        .ok_or_else(|| CommerceError::ProductNotFound(product_id.to_string()))?;

    let variant = match args.variant {
        Some(id) => {
            let variant_id = VariantId::new(id);
            Some(
                product
                    .variant(&variant_id)
                    .ok_or_else(|| CommerceError::VariantNotFound(variant_id.to_string()))?,
            )
        }
        None => None,
    };

    let price = resolve_price_at(
        &product.priced_entity(variant),
        &fixture.discount_rules,
        Utc::now(),
    );

    if ctx.output.is_json() {
        ctx.output.json(&price);
        return Ok(());
    }

    ctx.output.header(&product.display_name(variant));
    ctx.output
        .kv("Price", &Money::new(price.final_price, currency).display());
    if let Some(anchor) = price.compare_at_price.filter(|_| price.has_discount) {
        ctx.output.kv("Was", &strike(Money::new(anchor, currency)));
        ctx.output.kv("Saving", &format!("{}%", price.discount_pct));
    }
    if let Some(label) = &price.discount_label {
        ctx.output.kv("Promotion", label);
    }
    ctx.output
        .kv("In stock", &product.stock_for(variant).to_string());

    Ok(())
}
