//! Coupon CLI - inspect and price coupons from a catalog file.
//!
//! Commands:
//! - `coupon init` - Write a starter coupon catalog
//! - `coupon list` - List every coupon in the catalog
//! - `coupon inspect` - Show the derived state of one coupon
//! - `coupon quote` - Price a coupon against a cart
//! - `coupon generate` - Generate fresh coupon codes
//! - `coupon validate` - Check the catalog for invalid or stale coupons

mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{GenerateArgs, InitArgs, InspectArgs, ListArgs, QuoteArgs, ValidateArgs};

/// Coupon CLI - Inspect and price coupons
#[derive(Parser)]
#[command(name = "coupon")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Evaluate as of this RFC 3339 timestamp instead of the current time
    #[arg(long, global = true)]
    now: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter coupon catalog
    Init(InitArgs),

    /// List coupons in the catalog
    List(ListArgs),

    /// Show the derived state of a coupon
    Inspect(InspectArgs),

    /// Price a coupon against a cart file
    Quote(QuoteArgs),

    /// Generate random coupon codes
    Generate(GenerateArgs),

    /// Validate the coupon catalog
    Validate(ValidateArgs),
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "turbo_coupons=debug,coupon=debug"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    // Setup output formatting
    let output = output::Output::new(cli.verbose, cli.json);

    // Load config
    let ctx = match context::Context::load(cli.config.as_deref(), cli.now.as_deref(), output.clone())
    {
        Ok(ctx) => ctx,
        Err(e) => {
            output.error(&format!("{:#}", e));
            std::process::exit(1);
        }
    };

    // Execute command
    let result = match cli.command {
        Commands::Init(args) => commands::init::run(args, &ctx),
        Commands::List(args) => commands::list::run(args, &ctx),
        Commands::Inspect(args) => commands::inspect::run(args, &ctx),
        Commands::Quote(args) => commands::quote::run(args, &ctx),
        Commands::Generate(args) => commands::generate::run(args, &ctx),
        Commands::Validate(args) => commands::validate::run(args, &ctx),
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
