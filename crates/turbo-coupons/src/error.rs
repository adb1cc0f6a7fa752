//! Coupon error types.
//!
//! Evaluation itself never fails; these errors come from building a coupon
//! and from redeeming one through a [`CouponBook`](crate::CouponBook).

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CouponError {
    /// No coupon is registered under this code.
    #[error("Invalid coupon code: {0}")]
    InvalidCode(String),

    /// A coupon with this code already exists.
    #[error("Duplicate coupon code: {0}")]
    DuplicateCode(String),

    /// Past its validity window.
    #[error("Coupon expired: {0}")]
    Expired(String),

    /// Not yet inside its validity window.
    #[error("Coupon {code} not valid before {valid_from}")]
    NotYetValid {
        code: String,
        valid_from: DateTime<Utc>,
    },

    /// Total usage limit reached.
    #[error("Coupon usage limit reached: {0}")]
    UsageLimitReached(String),

    /// Per-customer usage limit reached.
    #[error("Coupon {code} already used {used} time(s) by this customer (limit {limit})")]
    CustomerLimitReached { code: String, used: u32, limit: u32 },

    /// Status is not `Active`.
    #[error("Coupon {code} is {status}")]
    Inactive { code: String, status: String },

    /// Customer fails the user, role or first-order restrictions.
    #[error("Coupon {0} cannot be used by this customer")]
    NotEligible(String),

    /// Order is outside the coupon's bounds or has nothing the coupon applies to.
    #[error("Coupon {0} does not apply to this order")]
    NotApplicable(String),

    /// Release requested for a customer with no recorded redemption.
    #[error("Coupon {code} has no redemption by {user} to release")]
    NoRedemption { code: String, user: String },

    /// A required builder field was never set.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// Builder validation failure.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The in-memory store's lock was poisoned by a panicking writer.
    #[error("Coupon store poisoned")]
    StorePoisoned,
}
