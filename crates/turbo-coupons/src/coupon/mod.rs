//! Coupon model and discount evaluation.
//!
//! Contains the coupon record, its builder, the evaluator and code generation.

mod builder;
mod code;
mod evaluate;
mod model;
mod types;

pub use builder::CouponBuilder;
pub use code::{generate_code, generate_default_code, normalize_code, DEFAULT_CODE_LENGTH};
pub use model::Coupon;
pub use types::{ApplicableItem, CouponStatus, CouponTarget, CouponType, DiscountResult};
