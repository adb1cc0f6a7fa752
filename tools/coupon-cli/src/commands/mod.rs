//! CLI command implementations.

pub mod generate;
pub mod init;
pub mod inspect;
pub mod list;
pub mod quote;
pub mod validate;

use clap::Args;

/// Arguments for the init command.
#[derive(Args)]
pub struct InitArgs {
    /// Where to write the catalog.
    #[arg(default_value = "coupons.toml")]
    pub path: String,

    /// Overwrite an existing file.
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for the list command.
#[derive(Args)]
pub struct ListArgs {
    /// Only show coupons that are currently valid.
    #[arg(long)]
    pub valid: bool,
}

/// Arguments for the inspect command.
#[derive(Args)]
pub struct InspectArgs {
    /// Coupon code.
    pub code: String,
}

/// Arguments for the quote command.
#[derive(Args)]
pub struct QuoteArgs {
    /// Coupon code.
    pub code: String,

    /// Cart file (JSON) with order, shipping and line item amounts.
    #[arg(long)]
    pub cart: String,

    /// Customer id.
    #[arg(short, long, default_value = "guest")]
    pub user: String,

    /// Customer role.
    #[arg(short, long, default_value = "customer")]
    pub role: String,

    /// Customer has no completed order yet.
    #[arg(long)]
    pub first_time: bool,

    /// Prior redemptions of this coupon by the customer.
    #[arg(long, default_value_t = 0)]
    pub prior_uses: u32,
}

/// Arguments for the generate command.
#[derive(Args)]
pub struct GenerateArgs {
    /// Number of codes to generate.
    #[arg(short = 'n', long, default_value_t = 1)]
    pub count: usize,

    /// Code length (default from settings).
    #[arg(short, long)]
    pub length: Option<usize>,
}

/// Arguments for the validate command.
#[derive(Args)]
pub struct ValidateArgs {
    /// Treat stale statuses as errors.
    #[arg(long)]
    pub strict: bool,
}
