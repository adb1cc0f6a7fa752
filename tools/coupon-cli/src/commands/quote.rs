//! Quote command - price a coupon against a cart file.

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use turbo_coupons::{
    ApplicableItem, CouponError, Currency, DiscountResult, Money, RedemptionRequest,
};

use crate::commands::QuoteArgs;
use crate::config::parse_currency;
use crate::context::Context;

/// Cart file contents. Amounts are major-unit decimals.
#[derive(Debug, Deserialize)]
pub struct CartFile {
    #[serde(default)]
    pub currency: Option<String>,
    pub order_amount: f64,
    #[serde(default)]
    pub shipping_amount: f64,
    #[serde(default)]
    pub items: Vec<CartItem>,
}

#[derive(Debug, Deserialize)]
pub struct CartItem {
    pub product_id: String,
    pub category_id: String,
    pub amount: f64,
}

impl CartFile {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read cart file: {}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse cart file: {}", path))
    }

    /// Build a redemption request in the cart's currency.
    pub fn to_request(&self, default_currency: Currency, args: &QuoteArgs) -> Result<RedemptionRequest> {
        let currency = match self.currency {
            Some(ref code) => parse_currency(code)?,
            None => default_currency,
        };
        let money = |amount: f64| Money::from_decimal(amount, currency);

        let items = self
            .items
            .iter()
            .map(|item| {
                ApplicableItem::new(
                    item.product_id.as_str(),
                    item.category_id.as_str(),
                    money(item.amount),
                )
            })
            .collect();

        Ok(RedemptionRequest::new(
            args.user.as_str(),
            args.role.as_str(),
            money(self.order_amount),
            money(self.shipping_amount),
        )
        .first_time(args.first_time)
        .with_items(items))
    }
}

#[derive(Serialize)]
struct QuoteReport<'a> {
    code: &'a str,
    accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    discount: Option<DiscountResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

/// Run the quote command.
pub fn run(args: QuoteArgs, ctx: &Context) -> Result<()> {
    let book = ctx.config.book()?;
    let cart_path = ctx.resolve_path(&args.cart);
    let cart = CartFile::load(&cart_path.to_string_lossy())?;
    let request = cart.to_request(ctx.config.currency()?, &args)?;

    ctx.output.debug(&format!(
        "Quoting {} for {} ({}) at {}",
        args.code,
        request.user_id,
        request.user_role,
        ctx.now.to_rfc3339()
    ));

    let outcome = book
        .set_customer_usage(&args.code, &request.user_id, args.prior_uses)
        .and_then(|_| book.quote(&args.code, &request, ctx.now));
    report(&args.code, outcome, ctx)
}

fn report(code: &str, outcome: Result<DiscountResult, CouponError>, ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        let report = match outcome {
            Ok(discount) => QuoteReport {
                code,
                accepted: true,
                discount: Some(discount),
                reason: None,
            },
            Err(ref e) => QuoteReport {
                code,
                accepted: false,
                discount: None,
                reason: Some(e.to_string()),
            },
        };
        ctx.output.json(&report);
        return Ok(());
    }

    match outcome {
        Ok(discount) => {
            if discount.has_discount() {
                ctx.output.success(&format!("{} applies", code));
            } else {
                ctx.output.warn(&format!("{} applies but takes nothing off", code));
            }
            ctx.output.kv("Applicable amount", &discount.applicable_amount.display());
            ctx.output.kv("Discount", &discount.discount_amount.display());
            Ok(())
        }
        Err(CouponError::InvalidCode(_)) => {
            Err(anyhow::anyhow!("Unknown coupon code: {}", code))
        }
        Err(e) => {
            ctx.output.warn(&format!("{} rejected: {}", code, e));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> QuoteArgs {
        QuoteArgs {
            code: "SAVE".to_string(),
            cart: "cart.json".to_string(),
            user: "u1".to_string(),
            role: "customer".to_string(),
            first_time: true,
            prior_uses: 0,
        }
    }

    #[test]
    fn test_cart_to_request() {
        let cart: CartFile = serde_json::from_str(
            r#"{
                "order_amount": 150.0,
                "shipping_amount": 4.99,
                "items": [
                    {"product_id": "p1", "category_id": "electronics", "amount": 100.0},
                    {"product_id": "p9", "category_id": "electronics", "amount": 50.0}
                ]
            }"#,
        )
        .unwrap();

        let request = cart.to_request(Currency::USD, &args()).unwrap();
        assert_eq!(request.order_amount, Money::new(15000, Currency::USD));
        assert_eq!(request.shipping_amount, Money::new(499, Currency::USD));
        assert_eq!(request.items.len(), 2);
        assert_eq!(request.items[1].product_id.as_str(), "p9");
        assert!(request.is_first_time);
    }

    #[test]
    fn test_cart_currency_overrides_default() {
        let cart: CartFile =
            serde_json::from_str(r#"{"currency": "gbp", "order_amount": 10.0}"#).unwrap();
        let request = cart.to_request(Currency::USD, &args()).unwrap();
        assert_eq!(request.order_amount.currency, Currency::GBP);
        assert!(request.items.is_empty());
    }
}
