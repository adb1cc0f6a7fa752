//! The coupon record and its in-place mutations.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{CouponStatus, CouponTarget, CouponType};
use crate::ids::{CategoryId, CouponId, ProductId, UserId};
use crate::money::{Currency, Money};

/// A redeemable discount definition with constraints and a usage counter.
///
/// Build one with [`Coupon::percentage`], [`Coupon::fixed_amount`] or
/// [`Coupon::free_shipping`]. Query methods never fail; mutations change
/// the value in place and leave persistence to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Coupon {
    pub id: CouponId,
    /// Code entered by the customer.
    pub code: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub coupon_type: CouponType,
    pub target: CouponTarget,
    /// Percentage (0-100) or major-unit amount, depending on `coupon_type`.
    pub discount_value: f64,
    pub currency: Currency,
    /// Cap on percentage discounts.
    pub max_discount_amount: Option<Money>,
    /// Inclusive lower bound on the pre-discount order total.
    pub min_order_amount: Option<Money>,
    /// Inclusive upper bound on the pre-discount order total.
    pub max_order_amount: Option<Money>,
    pub applicable_product_ids: Option<Vec<ProductId>>,
    pub applicable_category_ids: Option<Vec<CategoryId>>,
    pub excluded_product_ids: Option<Vec<ProductId>>,
    pub excluded_category_ids: Option<Vec<CategoryId>>,
    pub status: CouponStatus,
    /// Total redemptions allowed (None = unlimited).
    pub usage_limit: Option<u32>,
    pub usage_limit_per_customer: Option<u32>,
    pub usage_count: u32,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    /// Informational: combining coupons is decided by the checkout.
    pub is_stackable: bool,
    pub is_first_time_only: bool,
    pub applicable_user_ids: Option<Vec<UserId>>,
    pub applicable_user_roles: Option<Vec<String>>,
    pub buy_x_quantity: Option<u32>,
    pub get_y_quantity: Option<u32>,
    pub buy_x_product_ids: Option<Vec<ProductId>>,
    pub get_y_product_ids: Option<Vec<ProductId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, serde_json::Value>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Coupon {
    pub fn is_percentage_discount(&self) -> bool {
        self.coupon_type == CouponType::Percentage
    }

    pub fn is_fixed_amount_discount(&self) -> bool {
        self.coupon_type == CouponType::FixedAmount
    }

    pub fn is_free_shipping(&self) -> bool {
        self.coupon_type == CouponType::FreeShipping
    }

    pub fn is_buy_x_get_y(&self) -> bool {
        self.coupon_type == CouponType::BuyXGetY
    }

    /// Whether the total usage limit has been reached.
    pub fn is_used_up(&self) -> bool {
        self.usage_limit
            .map(|limit| self.usage_count >= limit)
            .unwrap_or(false)
    }

    /// Share of the usage limit consumed, rounded to a whole percent.
    ///
    /// Zero when there is no limit (or a limit of zero). Can exceed 100 if
    /// the counter was pushed past the limit.
    pub fn usage_percentage(&self) -> u32 {
        match self.usage_limit {
            Some(limit) if limit > 0 => {
                (self.usage_count as f64 / limit as f64 * 100.0).round() as u32
            }
            _ => 0,
        }
    }

    /// Redemptions left before the limit, `None` when unlimited.
    pub fn remaining_usage(&self) -> Option<u32> {
        self.usage_limit
            .map(|limit| limit.saturating_sub(self.usage_count))
    }

    /// Record one redemption.
    ///
    /// Never refuses: reaching the limit flips the status to `UsedUp` and
    /// later validity checks fail.
    pub fn increment_usage(&mut self) {
        self.usage_count = self.usage_count.saturating_add(1);
        if let Some(limit) = self.usage_limit {
            if self.usage_count >= limit {
                debug!(code = %self.code, usage_count = self.usage_count, limit, "coupon used up");
                self.status = CouponStatus::UsedUp;
            }
        }
        self.touch();
    }

    /// Undo one redemption. The counter stops at zero.
    pub fn decrement_usage(&mut self) {
        self.usage_count = self.usage_count.saturating_sub(1);
        if self.status == CouponStatus::UsedUp && self.usage_count < self.usage_limit.unwrap_or(0)
        {
            self.status = CouponStatus::Active;
        }
        self.touch();
    }

    pub fn activate(&mut self) {
        self.set_status(CouponStatus::Active);
    }

    pub fn deactivate(&mut self) {
        self.set_status(CouponStatus::Inactive);
    }

    pub fn mark_as_expired(&mut self) {
        self.set_status(CouponStatus::Expired);
    }

    pub fn mark_as_used_up(&mut self) {
        self.set_status(CouponStatus::UsedUp);
    }

    /// Store an extension value, creating the map on first use.
    pub fn add_metadata(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.metadata
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self.touch();
    }

    pub fn get_metadata(&self, key: &str) -> Option<&serde_json::Value> {
        self.metadata.as_ref().and_then(|m| m.get(key))
    }

    fn set_status(&mut self, status: CouponStatus) {
        if self.status != status {
            debug!(code = %self.code, from = %self.status, to = %status, "coupon status changed");
        }
        self.status = status;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
