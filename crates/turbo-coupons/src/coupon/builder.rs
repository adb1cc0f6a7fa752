//! Coupon construction.
//!
//! Each preset fixes the type and target, then every setter called on the
//! builder replaces whatever the preset chose. The last write wins, so
//! `Coupon::free_shipping("X").target(CouponTarget::OrderTotal)` really does
//! target the order total.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::model::Coupon;
use super::types::{CouponStatus, CouponTarget, CouponType};
use crate::error::CouponError;
use crate::ids::{CategoryId, CouponId, ProductId, UserId};
use crate::money::{Currency, Money};

impl Coupon {
    /// Percentage off the order total.
    pub fn percentage(code: impl Into<String>, percent: f64) -> CouponBuilder {
        CouponBuilder::new(code, CouponType::Percentage, CouponTarget::OrderTotal)
            .discount_value(percent)
    }

    /// Fixed amount (major units) off the order total.
    pub fn fixed_amount(code: impl Into<String>, amount: f64) -> CouponBuilder {
        CouponBuilder::new(code, CouponType::FixedAmount, CouponTarget::OrderTotal)
            .discount_value(amount)
    }

    /// Waive the shipping charge.
    pub fn free_shipping(code: impl Into<String>) -> CouponBuilder {
        CouponBuilder::new(code, CouponType::FreeShipping, CouponTarget::Shipping)
    }

    /// Start from an arbitrary type and target.
    pub fn builder(
        code: impl Into<String>,
        coupon_type: CouponType,
        target: CouponTarget,
    ) -> CouponBuilder {
        CouponBuilder::new(code, coupon_type, target)
    }
}

/// Builder for [`Coupon`].
#[derive(Debug, Clone)]
pub struct CouponBuilder {
    id: Option<CouponId>,
    code: String,
    name: Option<String>,
    description: Option<String>,
    coupon_type: CouponType,
    target: CouponTarget,
    discount_value: f64,
    currency: Currency,
    max_discount_amount: Option<Money>,
    min_order_amount: Option<Money>,
    max_order_amount: Option<Money>,
    applicable_product_ids: Option<Vec<ProductId>>,
    applicable_category_ids: Option<Vec<CategoryId>>,
    excluded_product_ids: Option<Vec<ProductId>>,
    excluded_category_ids: Option<Vec<CategoryId>>,
    status: CouponStatus,
    usage_limit: Option<u32>,
    usage_limit_per_customer: Option<u32>,
    usage_count: u32,
    valid_from: Option<DateTime<Utc>>,
    valid_to: Option<DateTime<Utc>>,
    is_stackable: bool,
    is_first_time_only: bool,
    applicable_user_ids: Option<Vec<UserId>>,
    applicable_user_roles: Option<Vec<String>>,
    buy_x_quantity: Option<u32>,
    get_y_quantity: Option<u32>,
    buy_x_product_ids: Option<Vec<ProductId>>,
    get_y_product_ids: Option<Vec<ProductId>>,
    metadata: Option<BTreeMap<String, serde_json::Value>>,
}

impl CouponBuilder {
    fn new(code: impl Into<String>, coupon_type: CouponType, target: CouponTarget) -> Self {
        Self {
            id: None,
            code: code.into(),
            name: None,
            description: None,
            coupon_type,
            target,
            discount_value: 0.0,
            currency: Currency::default(),
            max_discount_amount: None,
            min_order_amount: None,
            max_order_amount: None,
            applicable_product_ids: None,
            applicable_category_ids: None,
            excluded_product_ids: None,
            excluded_category_ids: None,
            status: CouponStatus::Active,
            usage_limit: None,
            usage_limit_per_customer: None,
            usage_count: 0,
            valid_from: None,
            valid_to: None,
            is_stackable: false,
            is_first_time_only: false,
            applicable_user_ids: None,
            applicable_user_roles: None,
            buy_x_quantity: None,
            get_y_quantity: None,
            buy_x_product_ids: None,
            get_y_product_ids: None,
            metadata: None,
        }
    }

    pub fn id(mut self, id: CouponId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn coupon_type(mut self, coupon_type: CouponType) -> Self {
        self.coupon_type = coupon_type;
        self
    }

    pub fn target(mut self, target: CouponTarget) -> Self {
        self.target = target;
        self
    }

    pub fn discount_value(mut self, value: f64) -> Self {
        self.discount_value = value;
        self
    }

    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    /// Cap for percentage discounts.
    pub fn max_discount(mut self, amount: Money) -> Self {
        self.max_discount_amount = Some(amount);
        self
    }

    pub fn min_order(mut self, amount: Money) -> Self {
        self.min_order_amount = Some(amount);
        self
    }

    pub fn max_order(mut self, amount: Money) -> Self {
        self.max_order_amount = Some(amount);
        self
    }

    pub fn applicable_products<I, P>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<ProductId>,
    {
        self.applicable_product_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn applicable_categories<I, C>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<CategoryId>,
    {
        self.applicable_category_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn exclude_products<I, P>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<ProductId>,
    {
        self.excluded_product_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn exclude_categories<I, C>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<CategoryId>,
    {
        self.excluded_category_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn status(mut self, status: CouponStatus) -> Self {
        self.status = status;
        self
    }

    pub fn usage_limit(mut self, limit: u32) -> Self {
        self.usage_limit = Some(limit);
        self
    }

    pub fn usage_limit_per_customer(mut self, limit: u32) -> Self {
        self.usage_limit_per_customer = Some(limit);
        self
    }

    /// Seed the counter, e.g. when loading a coupon that has already been redeemed.
    pub fn usage_count(mut self, count: u32) -> Self {
        self.usage_count = count;
        self
    }

    pub fn valid_from(mut self, from: DateTime<Utc>) -> Self {
        self.valid_from = Some(from);
        self
    }

    pub fn valid_to(mut self, to: DateTime<Utc>) -> Self {
        self.valid_to = Some(to);
        self
    }

    pub fn valid_between(self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.valid_from(from).valid_to(to)
    }

    pub fn stackable(mut self, stackable: bool) -> Self {
        self.is_stackable = stackable;
        self
    }

    pub fn first_time_only(mut self, first_time_only: bool) -> Self {
        self.is_first_time_only = first_time_only;
        self
    }

    pub fn applicable_users<I, U>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = U>,
        U: Into<UserId>,
    {
        self.applicable_user_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn applicable_roles<I, R>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        self.applicable_user_roles = Some(roles.into_iter().map(Into::into).collect());
        self
    }

    pub fn buy_x_get_y(mut self, buy: u32, get: u32) -> Self {
        self.buy_x_quantity = Some(buy);
        self.get_y_quantity = Some(get);
        self
    }

    pub fn buy_x_products<I, P>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<ProductId>,
    {
        self.buy_x_product_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn get_y_products<I, P>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<ProductId>,
    {
        self.get_y_product_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Validate and build the coupon.
    pub fn build(self) -> Result<Coupon, CouponError> {
        let code = self.code.trim().to_string();
        if code.is_empty() {
            return Err(CouponError::ValidationError(
                "coupon code must not be empty".to_string(),
            ));
        }

        let valid_from = self.valid_from.ok_or(CouponError::MissingField("valid_from"))?;
        let valid_to = self.valid_to.ok_or(CouponError::MissingField("valid_to"))?;
        if valid_from > valid_to {
            return Err(CouponError::ValidationError(format!(
                "{}: valid_from {} is after valid_to {}",
                code, valid_from, valid_to
            )));
        }

        if !self.discount_value.is_finite() || self.discount_value < 0.0 {
            return Err(CouponError::ValidationError(format!(
                "{}: discount value {} must be a non-negative number",
                code, self.discount_value
            )));
        }
        if self.coupon_type == CouponType::Percentage && self.discount_value > 100.0 {
            return Err(CouponError::ValidationError(format!(
                "{}: percentage {} exceeds 100",
                code, self.discount_value
            )));
        }

        for (field, amount) in [
            ("max_discount_amount", self.max_discount_amount),
            ("min_order_amount", self.min_order_amount),
            ("max_order_amount", self.max_order_amount),
        ] {
            if let Some(amount) = amount {
                if amount.currency != self.currency {
                    return Err(CouponError::ValidationError(format!(
                        "{}: {} is in {}, coupon is in {}",
                        code, field, amount.currency, self.currency
                    )));
                }
            }
        }

        if let (Some(min), Some(max)) = (self.min_order_amount, self.max_order_amount) {
            if min.amount_cents > max.amount_cents {
                return Err(CouponError::ValidationError(format!(
                    "{}: min_order_amount {} exceeds max_order_amount {}",
                    code, min, max
                )));
            }
        }

        let now = Utc::now();
        Ok(Coupon {
            id: self.id.unwrap_or_else(CouponId::generate),
            name: self.name.unwrap_or_else(|| code.clone()),
            code,
            description: self.description,
            coupon_type: self.coupon_type,
            target: self.target,
            discount_value: self.discount_value,
            currency: self.currency,
            max_discount_amount: self.max_discount_amount,
            min_order_amount: self.min_order_amount,
            max_order_amount: self.max_order_amount,
            applicable_product_ids: self.applicable_product_ids,
            applicable_category_ids: self.applicable_category_ids,
            excluded_product_ids: self.excluded_product_ids,
            excluded_category_ids: self.excluded_category_ids,
            status: self.status,
            usage_limit: self.usage_limit,
            usage_limit_per_customer: self.usage_limit_per_customer,
            usage_count: self.usage_count,
            valid_from,
            valid_to,
            is_stackable: self.is_stackable,
            is_first_time_only: self.is_first_time_only,
            applicable_user_ids: self.applicable_user_ids,
            applicable_user_roles: self.applicable_user_roles,
            buy_x_quantity: self.buy_x_quantity,
            get_y_quantity: self.get_y_quantity,
            buy_x_product_ids: self.buy_x_product_ids,
            get_y_product_ids: self.get_y_product_ids,
            metadata: self.metadata,
            created_at: now,
            updated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn window(builder: CouponBuilder) -> CouponBuilder {
        builder.valid_between(
            Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 31, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_presets() {
        let pct = window(Coupon::percentage("PCT", 20.0)).build().unwrap();
        assert_eq!(pct.coupon_type, CouponType::Percentage);
        assert_eq!(pct.target, CouponTarget::OrderTotal);
        assert_eq!(pct.status, CouponStatus::Active);
        assert_eq!(pct.discount_value, 20.0);
        assert_eq!(pct.name, "PCT");

        let fixed = window(Coupon::fixed_amount("FIX", 5.0)).build().unwrap();
        assert_eq!(fixed.coupon_type, CouponType::FixedAmount);
        assert_eq!(fixed.target, CouponTarget::OrderTotal);

        let ship = window(Coupon::free_shipping("SHIP")).build().unwrap();
        assert_eq!(ship.coupon_type, CouponType::FreeShipping);
        assert_eq!(ship.target, CouponTarget::Shipping);
        assert_eq!(ship.discount_value, 0.0);
        assert_eq!(ship.usage_count, 0);
    }

    #[test]
    fn test_overrides_win() {
        let c = window(Coupon::free_shipping("SHIP"))
            .target(CouponTarget::OrderTotal)
            .status(CouponStatus::Inactive)
            .build()
            .unwrap();
        assert_eq!(c.target, CouponTarget::OrderTotal);
        assert_eq!(c.status, CouponStatus::Inactive);

        let c = window(Coupon::percentage("PCT", 10.0))
            .coupon_type(CouponType::FixedAmount)
            .discount_value(7.5)
            .discount_value(2.5)
            .build()
            .unwrap();
        assert_eq!(c.coupon_type, CouponType::FixedAmount);
        assert_eq!(c.discount_value, 2.5);
    }

    #[test]
    fn test_code_is_trimmed() {
        let c = window(Coupon::percentage("  SPRING  ", 5.0)).build().unwrap();
        assert_eq!(c.code, "SPRING");
    }

    #[test]
    fn test_missing_window_rejected() {
        let err = Coupon::percentage("PCT", 10.0).build().unwrap_err();
        assert_eq!(err, CouponError::MissingField("valid_from"));

        let err = Coupon::percentage("PCT", 10.0)
            .valid_from(Utc::now())
            .build()
            .unwrap_err();
        assert_eq!(err, CouponError::MissingField("valid_to"));
    }

    #[test]
    fn test_inverted_window_rejected() {
        let err = Coupon::percentage("PCT", 10.0)
            .valid_between(
                Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap(),
            )
            .build();
        assert!(matches!(err, Err(CouponError::ValidationError(_))));
    }

    #[test]
    fn test_bad_values_rejected() {
        assert!(window(Coupon::percentage("PCT", 120.0)).build().is_err());
        assert!(window(Coupon::percentage("PCT", -1.0)).build().is_err());
        assert!(window(Coupon::fixed_amount("FIX", f64::NAN)).build().is_err());
        assert!(window(Coupon::percentage("", 10.0)).build().is_err());
        // Fixed amounts are not percentages.
        assert!(window(Coupon::fixed_amount("FIX", 250.0)).build().is_ok());
    }

    #[test]
    fn test_money_fields_must_match_currency() {
        let err = window(Coupon::percentage("PCT", 10.0))
            .currency(Currency::EUR)
            .max_discount(Money::new(500, Currency::USD))
            .build();
        assert!(matches!(err, Err(CouponError::ValidationError(_))));

        let ok = window(Coupon::percentage("PCT", 10.0))
            .max_discount(Money::new(500, Currency::EUR))
            .currency(Currency::EUR)
            .build();
        assert!(ok.is_ok());
    }

    #[test]
    fn test_min_above_max_rejected() {
        let err = window(Coupon::percentage("PCT", 10.0))
            .min_order(Money::new(5000, Currency::USD))
            .max_order(Money::new(1000, Currency::USD))
            .build();
        assert!(matches!(err, Err(CouponError::ValidationError(_))));
    }

    #[test]
    fn test_lists_and_metadata() {
        let c = window(Coupon::percentage("PCT", 10.0))
            .target(CouponTarget::SpecificCategories)
            .applicable_categories(["electronics", "books"])
            .exclude_products(["p9"])
            .applicable_roles(["customer"])
            .metadata("campaign", "launch")
            .build()
            .unwrap();
        assert_eq!(
            c.applicable_category_ids,
            Some(vec![CategoryId::new("electronics"), CategoryId::new("books")])
        );
        assert_eq!(c.excluded_product_ids, Some(vec![ProductId::new("p9")]));
        assert_eq!(c.applicable_user_roles, Some(vec!["customer".to_string()]));
        assert_eq!(
            c.get_metadata("campaign"),
            Some(&serde_json::Value::from("launch"))
        );
        assert!(c.applicable_product_ids.is_none());
    }
}
