//! Price a full checkout.

use anyhow::{Context as _, Result};
use chrono::Utc;
use serde::Serialize;
use storefront_commerce::prelude::*;

use super::QuoteArgs;
use crate::context::Context;
use crate::fixture::Fixture;
use crate::output::{minus, strike};

#[derive(Serialize)]
struct QuoteOutput<'a> {
    reconciliation: &'a ReconcileReport,
    summary: &'a CheckoutSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    order: Option<&'a PlacedOrder>,
}

/// Run the quote command.
pub async fn run(args: QuoteArgs, ctx: &Context) -> Result<()> {
    let fixture = Fixture::load(&ctx.resolve_path(&args.input))?;
    let config = &ctx.config;
    let now = Utc::now();

    let spinner = ctx.output.spinner("Reconciling cart with the catalog...");
    let report = reconcile_cart(
        &fixture.cart(config.currency),
        &fixture.catalog(),
        config.fetch_timeout(),
        now,
    )
    .await;
    spinner.finish_and_clear();
    let report = report.context("Cart reconciliation failed")?;

    if !report.has_changes() {
        ctx.output.info("Cart is up to date with the catalog");
    }
    for removed in &report.removed {
        ctx.output.warn(&format!(
            "Removed {} ({:?})",
            removed.name, removed.reason
        ));
    }
    for clamped in &report.clamped {
        ctx.output.warn(&format!(
            "Only {} left of {}, quantity lowered from {}",
            clamped.available, clamped.product_id, clamped.requested
        ));
    }

    let mut state = CheckoutState::new(report.cart.clone());
    state.discount_rules = fixture.discount_rules.clone();
    state.tax_rules = fixture.tax_rules.clone();
    state.shipping = fixture.shipping.clone();
    state.country = args
        .country
        .clone()
        .or_else(|| fixture.country.clone())
        .or_else(|| config.default_country.clone());

    let coupons = fixture.coupon_book();
    if let Some(code) = &args.coupon {
        let subtotal = state.cart.subtotal();
        match validate_coupon(
            code,
            &state.cart,
            subtotal,
            &coupons,
            config.coupon_lookup_timeout(),
            now,
        )
        .await
        {
            Ok(applied) => state.applied_coupon = Some(applied),
            Err(e) if e.is_retryable() => {
                return Err(e).context("Coupon lookup failed");
            }
            Err(e) => ctx.output.warn(&format!("Coupon {} not applied: {}", code.trim(), e)),
        }
    }

    let summary = state.refresh(now);

    let order = if args.place {
        let order = place_order(&state, now)?;
        if let Some(coupon_id) = &order.coupon_id {
            coupons.record_usage(coupon_id, &order.id).await?;
        }
        Some(order)
    } else {
        None
    };

    if ctx.output.is_json() {
        ctx.output.json(&QuoteOutput {
            reconciliation: &report,
            summary: &summary,
            order: order.as_ref(),
        });
        return Ok(());
    }

    print_summary(ctx, &state, &summary);
    if let Some(order) = &order {
        ctx.output
            .success(&format!("Placed order {} ({})", order.order_number, order.id));
    }
    Ok(())
}

fn print_summary(ctx: &Context, state: &CheckoutState, summary: &CheckoutSummary) {
    let out = &ctx.output;
    let totals = &summary.totals;
    let currency = totals.currency;

    out.header(&format!("Checkout for {}", state.cart.store_id));
    let widths = [28, 5, 12, 12];
    out.table_row(&["Item", "Qty", "Unit", "Was"], &widths);
    for line in &state.cart.lines {
        let was = line
            .compare_at_price
            .filter(|_| line.is_discounted())
            .map(|p| strike(Money::new(p, currency)))
            .unwrap_or_default();
        let quantity = line.quantity.to_string();
        let unit = Money::new(line.unit_price, currency).display();
        out.table_row(
            &[line.name.as_str(), quantity.as_str(), unit.as_str(), was.as_str()],
            &widths,
        );
    }

    out.header("Totals");
    out.kv("Subtotal", &totals.subtotal_money().display());
    if !summary.discounts.order_amount.is_zero() {
        let label = summary.order_discount.name.as_deref().unwrap_or("Discount");
        out.kv(label, &minus(Money::new(summary.discounts.order_amount, currency).rounded()));
    }
    if let Some(coupon) = &summary.coupon {
        out.kv(
            &format!("Coupon {}", coupon.code()),
            &minus(Money::new(summary.discounts.coupon_amount, currency).rounded()),
        );
    }
    if let Some(rejection) = &summary.coupon_rejection {
        out.warn(&format!("Coupon {} dropped: {}", rejection.code, rejection.message));
    }
    if let Some(rate) = &state.shipping {
        out.kv(&format!("Shipping ({})", rate.name), &totals.shipping_money().display());
    }
    for line in totals.tax_breakdown.values() {
        out.kv(&line.label, &Money::new(line.amount, currency).display());
    }
    out.kv("Total", &console::style(totals.total_money().display()).bold().to_string());
    out.debug(&format!("Unrounded subtotal {}", summary.subtotal));
}
