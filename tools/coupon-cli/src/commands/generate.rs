//! Generate command - random coupon codes that don't collide with the catalog.

use std::collections::HashSet;

use anyhow::{bail, Result};
use turbo_coupons::coupon::{generate_code, normalize_code};

use crate::commands::GenerateArgs;
use crate::context::Context;

/// Attempts per requested code before giving up on a crowded code space.
const MAX_ATTEMPTS_PER_CODE: usize = 100;

/// Run the generate command.
pub fn run(args: GenerateArgs, ctx: &Context) -> Result<()> {
    let length = args.length.unwrap_or(ctx.config.settings.code_length);
    if length == 0 {
        bail!("Code length must be at least 1");
    }

    let taken: HashSet<String> = ctx
        .config
        .coupons
        .iter()
        .map(|c| normalize_code(&c.code))
        .collect();

    let codes = unique_codes(args.count, length, &taken)?;

    if ctx.output.is_json() {
        ctx.output.json(&codes);
        return Ok(());
    }

    for code in &codes {
        println!("{}", code);
    }
    ctx.output
        .debug(&format!("Generated {} code(s) of length {}", codes.len(), length));
    Ok(())
}

/// Generate `count` distinct codes, none of them in `taken`.
fn unique_codes(count: usize, length: usize, taken: &HashSet<String>) -> Result<Vec<String>> {
    let mut seen = HashSet::with_capacity(count);
    let mut codes = Vec::with_capacity(count);
    let mut attempts = 0;

    while codes.len() < count {
        attempts += 1;
        if attempts > count.saturating_mul(MAX_ATTEMPTS_PER_CODE) {
            bail!(
                "Could only generate {} of {} unique codes of length {}",
                codes.len(),
                count,
                length
            );
        }

        let code = generate_code(length);
        if taken.contains(&code) || !seen.insert(code.clone()) {
            continue;
        }
        codes.push(code);
    }

    Ok(codes)
}
