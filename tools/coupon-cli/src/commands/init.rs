//! Init command - write a starter coupon catalog.

use anyhow::{bail, Context as _, Result};

use super::InitArgs;
use crate::config::{generate_default_config, CliConfig};
use crate::context::Context;

/// Run the init command.
pub fn run(args: InitArgs, ctx: &Context) -> Result<()> {
    let target = ctx.resolve_path(&args.path);

    if target.exists() && !args.force {
        bail!(
            "'{}' already exists (use --force to overwrite)",
            target.display()
        );
    }

    let content = generate_default_config();
    std::fs::write(&target, &content)
        .with_context(|| format!("Failed to write {}", target.display()))?;
    ctx.output.debug(&format!("Wrote {} bytes", content.len()));

    // Re-read what was written so a broken template never ships silently.
    let config = CliConfig::load(&target.to_string_lossy())?;
    let count = config.book()?.len()?;

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "path": target.display().to_string(),
            "coupons": count,
        }));
        return Ok(());
    }

    ctx.output.success(&format!(
        "Created {} with {} sample coupon(s)",
        target.display(),
        count
    ));
    ctx.output.info("Next steps:");
    ctx.output.list_item("coupon list");
    ctx.output.list_item("coupon quote WELCOME15 --cart cart.json --first-time");
    Ok(())
}
