//! Inspect command - show every derived property of one coupon.

use anyhow::{anyhow, Result};
use serde_json::json;

use crate::commands::InspectArgs;
use crate::context::Context;
use crate::output::{format_days, status_badge, yes_no};

/// Run the inspect command.
pub fn run(args: InspectArgs, ctx: &Context) -> Result<()> {
    let book = ctx.config.book()?;
    let coupon = book
        .get(&args.code)?
        .ok_or_else(|| anyhow!("Unknown coupon code: {}", args.code))?;
    let now = ctx.now;

    if ctx.output.is_json() {
        ctx.output.json(&json!({
            "coupon": coupon,
            "is_valid": coupon.is_valid(now),
            "is_expired": coupon.is_expired(now),
            "is_used_up": coupon.is_used_up(),
            "days_until_expiry": coupon.days_until_expiry(now),
            "usage_percentage": coupon.usage_percentage(),
            "remaining_usage": coupon.remaining_usage(),
        }));
        return Ok(());
    }

    ctx.output.header(&format!("{} ({})", coupon.code, coupon.name));
    if let Some(ref description) = coupon.description {
        ctx.output.info(description);
    }

    let value = if coupon.is_percentage_discount() {
        format!("{}%", coupon.discount_value)
    } else if coupon.is_fixed_amount_discount() {
        turbo_coupons::Money::from_decimal(coupon.discount_value, coupon.currency).display()
    } else if coupon.is_free_shipping() {
        "shipping".to_string()
    } else {
        match (coupon.buy_x_quantity, coupon.get_y_quantity) {
            (Some(buy), Some(get)) => format!("buy {} get {}", buy, get),
            _ => "buy x get y".to_string(),
        }
    };

    ctx.output.kv("Type", coupon.coupon_type.as_str());
    ctx.output.kv("Target", coupon.target.as_str());
    ctx.output.kv("Value", &value);
    if let Some(cap) = coupon.max_discount_amount {
        ctx.output.kv("Max discount", &cap.display());
    }
    if let Some(min) = coupon.min_order_amount {
        ctx.output.kv("Min order", &min.display());
    }
    if let Some(max) = coupon.max_order_amount {
        ctx.output.kv("Max order", &max.display());
    }
    ctx.output.kv("Status", &status_badge(coupon.status));
    ctx.output.kv("Valid now", yes_no(coupon.is_valid(now)));
    ctx.output.kv("Expired", yes_no(coupon.is_expired(now)));
    ctx.output.kv(
        "Window",
        &format!(
            "{} .. {} ({})",
            coupon.valid_from.to_rfc3339(),
            coupon.valid_to.to_rfc3339(),
            format_days(coupon.days_until_expiry(now))
        ),
    );

    let usage = match coupon.remaining_usage() {
        Some(remaining) => format!(
            "{} used, {} left ({}%)",
            coupon.usage_count,
            remaining,
            coupon.usage_percentage()
        ),
        None => format!("{} used, unlimited", coupon.usage_count),
    };
    ctx.output.kv("Usage", &usage);
    if let Some(limit) = coupon.usage_limit_per_customer {
        ctx.output.kv("Per customer", &limit.to_string());
    }
    ctx.output.kv("Stackable", yes_no(coupon.is_stackable));
    ctx.output.kv("First order only", yes_no(coupon.is_first_time_only));

    let lists = [
        ("Products", id_list(coupon.applicable_product_ids.as_deref())),
        ("Categories", id_list(coupon.applicable_category_ids.as_deref())),
        ("Excluded products", id_list(coupon.excluded_product_ids.as_deref())),
        ("Excluded categories", id_list(coupon.excluded_category_ids.as_deref())),
        ("Users", id_list(coupon.applicable_user_ids.as_deref())),
        ("Roles", coupon.applicable_user_roles.as_ref().map(|r| r.join(", "))),
    ];
    for (label, list) in lists {
        if let Some(list) = list {
            ctx.output.kv(label, &list);
        }
    }

    if let Some(ref metadata) = coupon.metadata {
        ctx.output.header("Metadata");
        for (key, value) in metadata {
            ctx.output.list_item(&format!("{} = {}", key, value));
        }
    }

    Ok(())
}

fn id_list<T: AsRef<str>>(ids: Option<&[T]>) -> Option<String> {
    ids.map(|ids| {
        ids.iter()
            .map(|id| id.as_ref())
            .collect::<Vec<_>>()
            .join(", ")
    })
}
