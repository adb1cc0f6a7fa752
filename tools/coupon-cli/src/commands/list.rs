//! List command - tabulate the coupon catalog.

use anyhow::Result;
use serde::Serialize;

use crate::commands::ListArgs;
use crate::context::Context;
use crate::output::{format_days, status_badge};

#[derive(Serialize)]
struct ListEntry {
    code: String,
    #[serde(rename = "type")]
    coupon_type: String,
    target: String,
    discount_value: f64,
    status: String,
    valid: bool,
    usage_count: u32,
    usage_limit: Option<u32>,
    days_until_expiry: i64,
}

/// Run the list command.
pub fn run(args: ListArgs, ctx: &Context) -> Result<()> {
    let book = ctx.config.book()?;
    let coupons: Vec<_> = book
        .coupons()?
        .into_iter()
        .filter(|c| !args.valid || c.is_valid(ctx.now))
        .collect();

    if ctx.output.is_json() {
        let entries: Vec<ListEntry> = coupons
            .iter()
            .map(|c| ListEntry {
                code: c.code.clone(),
                coupon_type: c.coupon_type.to_string(),
                target: c.target.to_string(),
                discount_value: c.discount_value,
                status: c.status.to_string(),
                valid: c.is_valid(ctx.now),
                usage_count: c.usage_count,
                usage_limit: c.usage_limit,
                days_until_expiry: c.days_until_expiry(ctx.now),
            })
            .collect();
        ctx.output.json(&entries);
        return Ok(());
    }

    if coupons.is_empty() {
        ctx.output.info("No coupons found");
        return Ok(());
    }

    ctx.output.header(&format!("Coupons ({})", coupons.len()));
    let widths = [14, 14, 20, 8, 10, 9, 14];
    ctx.output.table_row(
        &["CODE", "TYPE", "TARGET", "VALUE", "STATUS", "USAGE", "EXPIRES"],
        &widths,
    );

    for coupon in &coupons {
        let usage = match coupon.usage_limit {
            Some(limit) => format!("{}/{}", coupon.usage_count, limit),
            None => coupon.usage_count.to_string(),
        };
        // Styled text carries escape codes; pad by the visible label width.
        let status = status_badge(coupon.status);
        let status = format!(
            "{}{}",
            status,
            " ".repeat(10usize.saturating_sub(coupon.status.display_name().len()))
        );
        ctx.output.table_row(
            &[
                &coupon.code,
                coupon.coupon_type.as_str(),
                coupon.target.as_str(),
                &format!("{}", coupon.discount_value),
                &status,
                &usage,
                &format_days(coupon.days_until_expiry(ctx.now)),
            ],
            &[widths[0], widths[1], widths[2], widths[3], 0, widths[5], widths[6]],
        );
    }

    Ok(())
}
