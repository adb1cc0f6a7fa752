//! Coupon discount evaluation for TurboCommerce.
//!
//! This crate decides whether a coupon may be used and what it takes off an
//! order:
//!
//! - **Coupon**: type, target, order bounds, item allow/deny lists, usage
//!   counters and a validity window
//! - **Evaluation**: validity, customer eligibility and discount computation,
//!   all with an injected clock and none of them fallible
//! - **CouponBook**: an in-memory catalog that redeems atomically
//!
//! # Example
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use turbo_coupons::prelude::*;
//!
//! let coupon = Coupon::percentage("SAVE20", 20.0)
//!     .max_discount(Money::new(500, Currency::USD))
//!     .valid_between(
//!         Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
//!         Utc.with_ymd_and_hms(2026, 12, 31, 0, 0, 0).unwrap(),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let now = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
//! let result = coupon.calculate_discount(
//!     Money::new(10000, Currency::USD),
//!     Money::zero(Currency::USD),
//!     &[],
//!     now,
//! );
//! assert_eq!(result.discount_amount.amount_cents, 500);
//! ```

pub mod book;
pub mod coupon;
pub mod error;
pub mod ids;
pub mod money;

pub use book::{CouponBook, Redemption, RedemptionRequest};
pub use coupon::{
    generate_code, ApplicableItem, Coupon, CouponBuilder, CouponStatus, CouponTarget,
    CouponType, DiscountResult,
};
pub use error::CouponError;
pub use ids::*;
pub use money::{Currency, Money};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::book::{CouponBook, Redemption, RedemptionRequest};
    pub use crate::coupon::{
        generate_code, ApplicableItem, Coupon, CouponBuilder, CouponStatus, CouponTarget,
        CouponType, DiscountResult,
    };
    pub use crate::error::CouponError;
    pub use crate::ids::*;
    pub use crate::money::{Currency, Money};
}
