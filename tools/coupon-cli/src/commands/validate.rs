//! Validate command - check every coupon definition and flag stale statuses.

use std::collections::HashMap;

use anyhow::{bail, Result};
use serde::Serialize;
use turbo_coupons::coupon::normalize_code;
use turbo_coupons::CouponBook;

use crate::commands::ValidateArgs;
use crate::context::Context;

#[derive(Serialize, Default)]
struct ValidationReport {
    valid: Vec<String>,
    invalid: Vec<(String, String)>,
    duplicates: Vec<String>,
    stale: Vec<(String, String)>,
}

/// Run the validate command.
pub fn run(args: ValidateArgs, ctx: &Context) -> Result<()> {
    let mut report = ValidationReport::default();
    let book = CouponBook::new();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for (code, built) in ctx.config.build_coupons()? {
        *seen.entry(normalize_code(&code)).or_default() += 1;
        match built {
            Ok(coupon) => {
                if book.insert(coupon).is_err() {
                    report.duplicates.push(code);
                } else {
                    report.valid.push(code);
                }
            }
            Err(e) => report.invalid.push((code, e.to_string())),
        }
    }

    // Statuses the config claims that the clock or counters contradict.
    report.stale = book
        .sweep(ctx.now)?
        .into_iter()
        .map(|(code, status)| (code, status.to_string()))
        .collect();

    let failed = !report.invalid.is_empty()
        || !report.duplicates.is_empty()
        || (args.strict && !report.stale.is_empty());

    if ctx.output.is_json() {
        ctx.output.json(&report);
    } else {
        for (code, reason) in &report.invalid {
            ctx.output.error(&format!("{}: {}", code, reason));
        }
        for code in &report.duplicates {
            ctx.output.error(&format!(
                "{}: code defined {} times",
                code,
                seen.get(&normalize_code(code)).copied().unwrap_or(0)
            ));
        }
        for (code, status) in &report.stale {
            ctx.output
                .warn(&format!("{}: stored status is stale, should be {}", code, status));
        }
        if !failed {
            ctx.output
                .success(&format!("{} coupon(s) valid", report.valid.len()));
        }
    }

    if failed {
        bail!(
            "Catalog has {} invalid, {} duplicate and {} stale coupon(s)",
            report.invalid.len(),
            report.duplicates.len(),
            report.stale.len()
        );
    }
    Ok(())
}
