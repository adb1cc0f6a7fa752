//! Validity, eligibility and discount computation.
//!
//! Everything here is a pure function of the coupon and the inputs. The
//! current time is always passed in, so callers decide which clock counts.
//! Rejections are reported as `false` or a zero [`DiscountResult`], never
//! as errors.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::model::Coupon;
use super::types::{ApplicableItem, CouponStatus, CouponTarget, CouponType, DiscountResult};
use crate::ids::UserId;
use crate::money::Money;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

impl Coupon {
    /// Active, inside the validity window and below the usage limit.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        if self.status != CouponStatus::Active {
            return false;
        }

        if now < self.valid_from || now > self.valid_to {
            return false;
        }

        if let Some(limit) = self.usage_limit {
            if self.usage_count >= limit {
                return false;
            }
        }

        true
    }

    /// Past `valid_to`, whatever the stored status says.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.valid_to
    }

    /// Whole days left until `valid_to`, rounded up. Negative once expired.
    pub fn days_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        let millis = (self.valid_to - now).num_milliseconds();
        (millis as f64 / MILLIS_PER_DAY).ceil() as i64
    }

    /// Whether this customer may redeem the coupon right now.
    ///
    /// Absent user and role lists impose no restriction.
    pub fn can_be_used_by(
        &self,
        user_id: &UserId,
        user_role: &str,
        is_first_time: bool,
        now: DateTime<Utc>,
    ) -> bool {
        if !self.is_valid(now) {
            debug!(code = %self.code, "coupon not valid");
            return false;
        }

        if self.is_first_time_only && !is_first_time {
            debug!(code = %self.code, user = %user_id, "coupon restricted to first orders");
            return false;
        }

        if let Some(ref users) = self.applicable_user_ids {
            if !users.contains(user_id) {
                debug!(code = %self.code, user = %user_id, "user not on coupon allow-list");
                return false;
            }
        }

        if let Some(ref roles) = self.applicable_user_roles {
            if !roles.iter().any(|role| role == user_role) {
                debug!(code = %self.code, role = user_role, "role not on coupon allow-list");
                return false;
            }
        }

        true
    }

    /// Whether a customer with `customer_usage` prior redemptions may redeem again.
    pub fn within_customer_limit(&self, customer_usage: u32) -> bool {
        self.usage_limit_per_customer
            .map(|limit| customer_usage < limit)
            .unwrap_or(true)
    }

    /// Whether a line item passes the allow-lists and avoids the deny-lists.
    ///
    /// Matching either allow-list is enough. A deny-list match always wins.
    pub fn is_item_applicable(&self, item: &ApplicableItem) -> bool {
        let product_allowed = self
            .applicable_product_ids
            .as_ref()
            .map(|ids| ids.contains(&item.product_id))
            .unwrap_or(true);
        let category_allowed = self
            .applicable_category_ids
            .as_ref()
            .map(|ids| ids.contains(&item.category_id))
            .unwrap_or(true);

        if !(product_allowed || category_allowed) {
            return false;
        }

        let product_excluded = self
            .excluded_product_ids
            .as_ref()
            .is_some_and(|ids| ids.contains(&item.product_id));
        let category_excluded = self
            .excluded_category_ids
            .as_ref()
            .is_some_and(|ids| ids.contains(&item.category_id));

        !product_excluded && !category_excluded
    }

    /// Compute the discount this coupon gives an order.
    ///
    /// `applicable_items` only matters for product and category targets.
    /// Amounts in a currency other than the coupon's never match.
    pub fn calculate_discount(
        &self,
        order_amount: Money,
        shipping_amount: Money,
        applicable_items: &[ApplicableItem],
        now: DateTime<Utc>,
    ) -> DiscountResult {
        let zero = DiscountResult::zero(self.currency);

        if !self.is_valid(now) {
            debug!(code = %self.code, "coupon not valid, no discount");
            return zero;
        }

        if order_amount.currency != self.currency || shipping_amount.currency != self.currency {
            debug!(
                code = %self.code,
                coupon_currency = %self.currency,
                order_currency = %order_amount.currency,
                "currency mismatch, no discount"
            );
            return zero;
        }

        if let Some(ref min) = self.min_order_amount {
            if !matches!(
                order_amount.compare(min),
                Some(Ordering::Greater | Ordering::Equal)
            ) {
                debug!(code = %self.code, order = %order_amount, min = %min, "order below minimum");
                return zero;
            }
        }

        if let Some(ref max) = self.max_order_amount {
            if !matches!(order_amount.compare(max), Some(Ordering::Less | Ordering::Equal)) {
                debug!(code = %self.code, order = %order_amount, max = %max, "order above maximum");
                return zero;
            }
        }

        let applicable_amount = if self.target.is_item_based() {
            self.applicable_item_total(applicable_items)
        } else if self.target == CouponTarget::Shipping {
            shipping_amount
        } else {
            order_amount
        };

        let discount_amount = match self.coupon_type {
            CouponType::Percentage => {
                let discount = applicable_amount.percentage(self.discount_value);
                match self.max_discount_amount {
                    Some(ref cap) => discount
                        .min_of(cap)
                        .unwrap_or_else(|| Money::zero(self.currency)),
                    None => discount,
                }
            }
            CouponType::FixedAmount => Money::from_decimal(self.discount_value, self.currency)
                .min_of(&applicable_amount)
                .unwrap_or_else(|| Money::zero(self.currency)),
            CouponType::FreeShipping => {
                if self.target == CouponTarget::Shipping {
                    shipping_amount
                } else {
                    Money::zero(self.currency)
                }
            }
            // Buy-X-get-Y needs cart quantities; it never discounts here.
            CouponType::BuyXGetY => Money::zero(self.currency),
        };

        DiscountResult {
            discount_amount: discount_amount.non_negative(),
            applicable_amount,
        }
    }

    /// Bring a stale `Active` status in line with the window and usage counter.
    ///
    /// Returns the new status when it changed.
    pub fn reconcile_status(&mut self, now: DateTime<Utc>) -> Option<CouponStatus> {
        if self.status != CouponStatus::Active {
            return None;
        }

        if self.is_expired(now) {
            self.mark_as_expired();
        } else if self.is_used_up() {
            self.mark_as_used_up();
        } else {
            return None;
        }

        Some(self.status)
    }

    fn applicable_item_total(&self, items: &[ApplicableItem]) -> Money {
        items
            .iter()
            .filter(|item| self.is_item_applicable(item))
            .fold(Money::zero(self.currency), |total, item| {
                if !total.same_currency(&item.amount) {
                    debug!(
                        code = %self.code,
                        product = %item.product_id,
                        currency = %item.amount.currency,
                        "skipping item in foreign currency"
                    );
                    return total;
                }
                total.try_add(&item.amount).unwrap_or_else(|| {
                    debug!(
                        code = %self.code,
                        product = %item.product_id,
                        "item total overflowed, skipping item"
                    );
                    total
                })
            })
    }
}
