//! CLI configuration: settings plus the coupon catalog.

use std::collections::BTreeMap;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use turbo_coupons::{
    Coupon, CouponBook, CouponError, CouponStatus, CouponTarget, CouponType, Currency, Money,
};

/// CLI configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub settings: Settings,

    /// Coupon definitions.
    #[serde(default)]
    pub coupons: Vec<CouponDefinition>,
}

impl CliConfig {
    /// Load config from a file. `.json` files are JSON, everything else TOML.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        if path.ends_with(".json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path))
        }
    }

    pub fn currency(&self) -> Result<Currency> {
        parse_currency(&self.settings.currency)
    }

    /// Build every definition, keeping failures alongside their code.
    pub fn build_coupons(&self) -> Result<Vec<(String, Result<Coupon, CouponError>)>> {
        let currency = self.currency()?;
        self.coupons
            .iter()
            .map(|def| -> Result<_> { Ok((def.code.clone(), def.to_coupon(currency)?)) })
            .collect()
    }

    /// Build the catalog, failing on the first invalid or duplicate coupon.
    pub fn book(&self) -> Result<CouponBook> {
        let book = CouponBook::new();
        for (code, coupon) in self.build_coupons()? {
            let coupon = coupon.with_context(|| format!("Invalid coupon {}", code))?;
            book.insert(coupon)
                .with_context(|| format!("Cannot load coupon {}", code))?;
        }
        Ok(book)
    }
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Currency for coupons and carts that don't name one.
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Default length for generated codes.
    #[serde(default = "default_code_length")]
    pub code_length: usize,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_code_length() -> usize {
    turbo_coupons::coupon::DEFAULT_CODE_LENGTH
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            code_length: default_code_length(),
        }
    }
}

/// A coupon as written in the config file.
///
/// Money fields are major-unit decimals in the coupon currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponDefinition {
    pub code: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub coupon_type: CouponType,
    /// Defaults to the preset for the type.
    #[serde(default)]
    pub target: Option<CouponTarget>,
    #[serde(default)]
    pub discount_value: f64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub max_discount_amount: Option<f64>,
    #[serde(default)]
    pub min_order_amount: Option<f64>,
    #[serde(default)]
    pub max_order_amount: Option<f64>,
    #[serde(default)]
    pub applicable_product_ids: Option<Vec<String>>,
    #[serde(default)]
    pub applicable_category_ids: Option<Vec<String>>,
    #[serde(default)]
    pub excluded_product_ids: Option<Vec<String>>,
    #[serde(default)]
    pub excluded_category_ids: Option<Vec<String>>,
    #[serde(default)]
    pub status: Option<CouponStatus>,
    #[serde(default)]
    pub usage_limit: Option<u32>,
    #[serde(default)]
    pub usage_limit_per_customer: Option<u32>,
    #[serde(default)]
    pub usage_count: u32,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    #[serde(default)]
    pub is_stackable: bool,
    #[serde(default)]
    pub is_first_time_only: bool,
    #[serde(default)]
    pub applicable_user_ids: Option<Vec<String>>,
    #[serde(default)]
    pub applicable_user_roles: Option<Vec<String>>,
    #[serde(default)]
    pub buy_x_quantity: Option<u32>,
    #[serde(default)]
    pub get_y_quantity: Option<u32>,
    #[serde(default)]
    pub buy_x_product_ids: Option<Vec<String>>,
    #[serde(default)]
    pub get_y_product_ids: Option<Vec<String>>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl CouponDefinition {
    /// Run the definition through the coupon builder.
    ///
    /// The outer error is a config problem (unknown currency); the inner one
    /// is the builder's validation result.
    pub fn to_coupon(&self, default_currency: Currency) -> Result<Result<Coupon, CouponError>> {
        let currency = match self.currency {
            Some(ref code) => parse_currency(code)?,
            None => default_currency,
        };
        let money = |amount: f64| Money::from_decimal(amount, currency);

        let mut builder = match self.coupon_type {
            CouponType::Percentage => Coupon::percentage(&self.code, self.discount_value),
            CouponType::FixedAmount => Coupon::fixed_amount(&self.code, self.discount_value),
            CouponType::FreeShipping => Coupon::free_shipping(&self.code),
            CouponType::BuyXGetY => {
                Coupon::builder(&self.code, CouponType::BuyXGetY, CouponTarget::OrderTotal)
            }
        }
        .currency(currency)
        .discount_value(self.discount_value)
        .usage_count(self.usage_count)
        .valid_between(self.valid_from, self.valid_to)
        .stackable(self.is_stackable)
        .first_time_only(self.is_first_time_only);

        if let Some(ref name) = self.name {
            builder = builder.name(name);
        }
        if let Some(ref description) = self.description {
            builder = builder.description(description);
        }
        if let Some(target) = self.target {
            builder = builder.target(target);
        }
        if let Some(amount) = self.max_discount_amount {
            builder = builder.max_discount(money(amount));
        }
        if let Some(amount) = self.min_order_amount {
            builder = builder.min_order(money(amount));
        }
        if let Some(amount) = self.max_order_amount {
            builder = builder.max_order(money(amount));
        }
        if let Some(ref ids) = self.applicable_product_ids {
            builder = builder.applicable_products(ids.iter().map(String::as_str));
        }
        if let Some(ref ids) = self.applicable_category_ids {
            builder = builder.applicable_categories(ids.iter().map(String::as_str));
        }
        if let Some(ref ids) = self.excluded_product_ids {
            builder = builder.exclude_products(ids.iter().map(String::as_str));
        }
        if let Some(ref ids) = self.excluded_category_ids {
            builder = builder.exclude_categories(ids.iter().map(String::as_str));
        }
        if let Some(status) = self.status {
            builder = builder.status(status);
        }
        if let Some(limit) = self.usage_limit {
            builder = builder.usage_limit(limit);
        }
        if let Some(limit) = self.usage_limit_per_customer {
            builder = builder.usage_limit_per_customer(limit);
        }
        if let Some(ref ids) = self.applicable_user_ids {
            builder = builder.applicable_users(ids.iter().map(String::as_str));
        }
        if let Some(ref roles) = self.applicable_user_roles {
            builder = builder.applicable_roles(roles.iter().cloned());
        }
        if let (Some(buy), Some(get)) = (self.buy_x_quantity, self.get_y_quantity) {
            builder = builder.buy_x_get_y(buy, get);
        }
        if let Some(ref ids) = self.buy_x_product_ids {
            builder = builder.buy_x_products(ids.iter().map(String::as_str));
        }
        if let Some(ref ids) = self.get_y_product_ids {
            builder = builder.get_y_products(ids.iter().map(String::as_str));
        }
        for (key, value) in &self.metadata {
            builder = builder.metadata(key.clone(), value.clone());
        }

        Ok(builder.build())
    }
}

pub fn parse_currency(code: &str) -> Result<Currency> {
    Currency::from_code(code).ok_or_else(|| anyhow!("Unknown currency: {}", code))
}

/// Generate a starter coupons.toml.
pub fn generate_default_config() -> String {
    r#"# Coupon catalog

[settings]
currency = "USD"
code_length = 8

[[coupons]]
code = "WELCOME15"
name = "15% off your first order"
type = "percentage"
discount_value = 15.0
max_discount_amount = 50.0
is_first_time_only = true
usage_limit_per_customer = 1
valid_from = "2026-01-01T00:00:00Z"
valid_to = "2026-12-31T23:59:59Z"

[[coupons]]
code = "FREESHIP"
type = "free_shipping"
min_order_amount = 25.0
valid_from = "2026-01-01T00:00:00Z"
valid_to = "2026-12-31T23:59:59Z"

[[coupons]]
code = "GADGETS10"
type = "fixed_amount"
target = "specific_categories"
discount_value = 10.0
applicable_category_ids = ["electronics"]
excluded_product_ids = ["gift-card"]
usage_limit = 500
valid_from = "2026-01-01T00:00:00Z"
valid_to = "2026-06-30T23:59:59Z"

[coupons.metadata]
campaign = "spring-launch"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses_and_builds() {
        let config: CliConfig = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(config.coupons.len(), 3);

        let book = config.book().unwrap();
        assert_eq!(book.len().unwrap(), 3);

        let gadgets = book.get("GADGETS10").unwrap().unwrap();
        assert_eq!(gadgets.target, CouponTarget::SpecificCategories);
        assert_eq!(gadgets.discount_value, 10.0);
        assert_eq!(
            gadgets.get_metadata("campaign"),
            Some(&serde_json::Value::from("spring-launch"))
        );

        let ship = book.get("FREESHIP").unwrap().unwrap();
        assert_eq!(ship.target, CouponTarget::Shipping);
        assert_eq!(ship.min_order_amount, Some(Money::new(2500, Currency::USD)));
    }

    #[test]
    fn test_invalid_definition_reported_per_coupon() {
        let config: CliConfig = toml::from_str(
            r#"
[[coupons]]
code = "TOOMUCH"
type = "percentage"
discount_value = 150.0
valid_from = "2026-01-01T00:00:00Z"
valid_to = "2026-12-31T23:59:59Z"
"#,
        )
        .unwrap();

        let built = config.build_coupons().unwrap();
        assert_eq!(built.len(), 1);
        assert!(built[0].1.is_err());
        assert!(config.book().is_err());
    }

    #[test]
    fn test_unknown_currency_is_config_error() {
        let config: CliConfig = toml::from_str(
            r#"
[settings]
currency = "ZZZ"
"#,
        )
        .unwrap();
        assert!(config.currency().is_err());
    }

    #[test]
    fn test_json_config() {
        let json = r#"{
            "coupons": [{
                "code": "EUR5",
                "type": "fixed_amount",
                "discount_value": 5.0,
                "currency": "EUR",
                "valid_from": "2026-01-01T00:00:00Z",
                "valid_to": "2026-02-01T00:00:00Z"
            }]
        }"#;
        let config: CliConfig = serde_json::from_str(json).unwrap();
        let book = config.book().unwrap();
        assert_eq!(book.get("EUR5").unwrap().unwrap().currency, Currency::EUR);
    }
}
