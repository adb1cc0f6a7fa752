//! Coupon enums and evaluation value types.

use crate::ids::{CategoryId, ProductId};
use crate::money::{Currency, Money};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the discount magnitude is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponType {
    /// `discount_value` is a percentage (0-100) of the applicable amount.
    Percentage,
    /// `discount_value` is an amount in the coupon currency.
    FixedAmount,
    /// Waives the shipping charge.
    FreeShipping,
    /// Buy X get Y. Stored but never discounts.
    BuyXGetY,
}

impl CouponType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CouponType::Percentage => "percentage",
            CouponType::FixedAmount => "fixed_amount",
            CouponType::FreeShipping => "free_shipping",
            CouponType::BuyXGetY => "buy_x_get_y",
        }
    }
}

impl fmt::Display for CouponType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The monetary base a discount is computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponTarget {
    OrderTotal,
    Shipping,
    SpecificProducts,
    SpecificCategories,
}

impl CouponTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            CouponTarget::OrderTotal => "order_total",
            CouponTarget::Shipping => "shipping",
            CouponTarget::SpecificProducts => "specific_products",
            CouponTarget::SpecificCategories => "specific_categories",
        }
    }

    /// Whether the applicable amount comes from filtered line items.
    pub fn is_item_based(&self) -> bool {
        matches!(
            self,
            CouponTarget::SpecificProducts | CouponTarget::SpecificCategories
        )
    }
}

impl fmt::Display for CouponTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored lifecycle marker.
///
/// This is a cache: gating decisions re-derive validity from the window and
/// the usage counters through [`Coupon::is_valid`](crate::Coupon::is_valid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CouponStatus {
    #[default]
    Active,
    Inactive,
    Expired,
    UsedUp,
}

impl CouponStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CouponStatus::Active => "active",
            CouponStatus::Inactive => "inactive",
            CouponStatus::Expired => "expired",
            CouponStatus::UsedUp => "used_up",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CouponStatus::Active => "Active",
            CouponStatus::Inactive => "Inactive",
            CouponStatus::Expired => "Expired",
            CouponStatus::UsedUp => "Used up",
        }
    }
}

impl fmt::Display for CouponStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A line item as seen by target-based filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicableItem {
    pub product_id: ProductId,
    pub category_id: CategoryId,
    /// Line total for this item.
    pub amount: Money,
}

impl ApplicableItem {
    pub fn new(
        product_id: impl Into<ProductId>,
        category_id: impl Into<CategoryId>,
        amount: Money,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            category_id: category_id.into(),
            amount,
        }
    }
}

/// Outcome of a discount computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountResult {
    /// Amount taken off the order. Never negative.
    pub discount_amount: Money,
    /// The base the discount was computed against.
    pub applicable_amount: Money,
}

impl DiscountResult {
    /// The "coupon does not apply" result.
    pub fn zero(currency: Currency) -> Self {
        Self {
            discount_amount: Money::zero(currency),
            applicable_amount: Money::zero(currency),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.discount_amount.is_zero() && self.applicable_amount.is_zero()
    }

    pub fn has_discount(&self) -> bool {
        self.discount_amount.is_positive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enums_use_snake_case_on_the_wire() {
        assert_eq!(
            serde_json::to_string(&CouponType::BuyXGetY).unwrap(),
            "\"buy_x_get_y\""
        );
        assert_eq!(
            serde_json::to_string(&CouponStatus::UsedUp).unwrap(),
            "\"used_up\""
        );
        let target: CouponTarget = serde_json::from_str("\"specific_categories\"").unwrap();
        assert_eq!(target, CouponTarget::SpecificCategories);
        assert!(target.is_item_based());
    }

    #[test]
    fn test_zero_result() {
        let zero = DiscountResult::zero(Currency::EUR);
        assert!(zero.is_zero());
        assert!(!zero.has_discount());
        assert_eq!(zero.discount_amount.currency, Currency::EUR);
    }
}
