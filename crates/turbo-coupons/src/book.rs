//! In-memory coupon catalog with serialized redemption.
//!
//! [`Coupon`] itself never refuses an increment, so two checkouts that both
//! saw `usage_count < usage_limit` could each redeem the last slot. The book
//! runs the eligibility check and the increment inside one critical
//! section, which is what a store has to provide with a conditional update.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::coupon::{normalize_code, ApplicableItem, Coupon, CouponStatus, DiscountResult};
use crate::error::CouponError;
use crate::ids::{RedemptionId, UserId};
use crate::money::Money;

/// Customer and order context for a quote or redemption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedemptionRequest {
    pub user_id: UserId,
    pub user_role: String,
    /// Customer has no completed order yet.
    pub is_first_time: bool,
    /// Pre-discount order total.
    pub order_amount: Money,
    pub shipping_amount: Money,
    /// Line items for product and category targets.
    #[serde(default)]
    pub items: Vec<ApplicableItem>,
}

impl RedemptionRequest {
    pub fn new(
        user_id: impl Into<UserId>,
        user_role: impl Into<String>,
        order_amount: Money,
        shipping_amount: Money,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            user_role: user_role.into(),
            is_first_time: false,
            order_amount,
            shipping_amount,
            items: Vec::new(),
        }
    }

    pub fn first_time(mut self, is_first_time: bool) -> Self {
        self.is_first_time = is_first_time;
        self
    }

    pub fn with_items(mut self, items: Vec<ApplicableItem>) -> Self {
        self.items = items;
        self
    }
}

/// A successful redemption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Redemption {
    pub id: RedemptionId,
    pub code: String,
    pub user_id: UserId,
    pub discount: DiscountResult,
    /// Coupon usage count after this redemption.
    pub usage_count: u32,
    pub redeemed_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct BookState {
    coupons: HashMap<String, Coupon>,
    customer_usage: HashMap<(String, UserId), u32>,
}

impl BookState {
    fn customer_usage(&self, code: &str, user_id: &UserId) -> u32 {
        self.customer_usage
            .get(&(code.to_string(), user_id.clone()))
            .copied()
            .unwrap_or(0)
    }
}

/// Thread-safe catalog of coupons keyed by normalized code.
#[derive(Debug, Default)]
pub struct CouponBook {
    state: Mutex<BookState>,
}

impl CouponBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a book from coupons, rejecting duplicate codes.
    pub fn from_coupons(coupons: impl IntoIterator<Item = Coupon>) -> Result<Self, CouponError> {
        let book = Self::new();
        for coupon in coupons {
            book.insert(coupon)?;
        }
        Ok(book)
    }

    fn lock(&self) -> Result<MutexGuard<'_, BookState>, CouponError> {
        self.state.lock().map_err(|_| CouponError::StorePoisoned)
    }

    /// Add a coupon. Codes are unique after trimming and upper-casing.
    pub fn insert(&self, coupon: Coupon) -> Result<(), CouponError> {
        let key = normalize_code(&coupon.code);
        let mut state = self.lock()?;
        if state.coupons.contains_key(&key) {
            return Err(CouponError::DuplicateCode(coupon.code));
        }
        debug!(code = %key, "coupon registered");
        state.coupons.insert(key, coupon);
        Ok(())
    }

    pub fn remove(&self, code: &str) -> Result<Option<Coupon>, CouponError> {
        let key = normalize_code(code);
        let mut state = self.lock()?;
        state.customer_usage.retain(|(c, _), _| *c != key);
        Ok(state.coupons.remove(&key))
    }

    /// Snapshot of one coupon.
    pub fn get(&self, code: &str) -> Result<Option<Coupon>, CouponError> {
        Ok(self.lock()?.coupons.get(&normalize_code(code)).cloned())
    }

    /// Snapshot of every coupon, sorted by code.
    pub fn coupons(&self) -> Result<Vec<Coupon>, CouponError> {
        let mut coupons: Vec<Coupon> = self.lock()?.coupons.values().cloned().collect();
        coupons.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(coupons)
    }

    pub fn len(&self) -> Result<usize, CouponError> {
        Ok(self.lock()?.coupons.len())
    }

    pub fn is_empty(&self) -> Result<bool, CouponError> {
        Ok(self.lock()?.coupons.is_empty())
    }

    pub fn customer_usage(&self, code: &str, user_id: &UserId) -> Result<u32, CouponError> {
        Ok(self.lock()?.customer_usage(&normalize_code(code), user_id))
    }

    /// Seed a customer's redemption count, e.g. when loading from a store.
    pub fn set_customer_usage(
        &self,
        code: &str,
        user_id: &UserId,
        count: u32,
    ) -> Result<(), CouponError> {
        let key = normalize_code(code);
        let mut state = self.lock()?;
        if !state.coupons.contains_key(&key) {
            return Err(CouponError::InvalidCode(code.to_string()));
        }
        state.customer_usage.insert((key, user_id.clone()), count);
        Ok(())
    }

    /// Price a coupon against an order without redeeming it.
    pub fn quote(
        &self,
        code: &str,
        request: &RedemptionRequest,
        now: DateTime<Utc>,
    ) -> Result<DiscountResult, CouponError> {
        let key = normalize_code(code);
        let state = self.lock()?;
        let coupon = state
            .coupons
            .get(&key)
            .ok_or_else(|| CouponError::InvalidCode(code.to_string()))?;
        check(coupon, state.customer_usage(&key, &request.user_id), request, now)
    }

    /// Check eligibility and record the redemption atomically.
    pub fn redeem(
        &self,
        code: &str,
        request: &RedemptionRequest,
        now: DateTime<Utc>,
    ) -> Result<Redemption, CouponError> {
        let key = normalize_code(code);
        let mut state = self.lock()?;
        let used = state.customer_usage(&key, &request.user_id);

        let coupon = state
            .coupons
            .get_mut(&key)
            .ok_or_else(|| CouponError::InvalidCode(code.to_string()))?;
        let discount = check(coupon, used, request, now)?;
        let customer_count = used.saturating_add(1);
        coupon.increment_usage();

        let redemption = Redemption {
            id: RedemptionId::generate(),
            code: coupon.code.clone(),
            user_id: request.user_id.clone(),
            discount,
            usage_count: coupon.usage_count,
            redeemed_at: now,
        };

        state
            .customer_usage
            .insert((key, request.user_id.clone()), customer_count);

        info!(
            code = %redemption.code,
            user = %redemption.user_id,
            discount = %redemption.discount.discount_amount,
            usage_count = redemption.usage_count,
            "coupon redeemed"
        );
        Ok(redemption)
    }

    /// Undo a redemption, e.g. when the order is cancelled.
    ///
    /// Only a customer with a recorded redemption can release one; both
    /// counters stay untouched otherwise.
    pub fn release(&self, code: &str, user_id: &UserId) -> Result<(), CouponError> {
        let key = normalize_code(code);
        let mut state = self.lock()?;
        let BookState {
            coupons,
            customer_usage,
        } = &mut *state;

        let coupon = coupons
            .get_mut(&key)
            .ok_or_else(|| CouponError::InvalidCode(code.to_string()))?;
        let count = match customer_usage.get_mut(&(key, user_id.clone())) {
            Some(count) if *count > 0 => count,
            _ => {
                return Err(CouponError::NoRedemption {
                    code: coupon.code.clone(),
                    user: user_id.to_string(),
                })
            }
        };

        *count -= 1;
        coupon.decrement_usage();
        info!(code, user = %user_id, "coupon redemption released");
        Ok(())
    }

    /// Reconcile stored statuses with the clock and usage counters.
    ///
    /// Returns the codes whose status changed, sorted.
    pub fn sweep(&self, now: DateTime<Utc>) -> Result<Vec<(String, CouponStatus)>, CouponError> {
        let mut state = self.lock()?;
        let mut changed: Vec<(String, CouponStatus)> = state
            .coupons
            .values_mut()
            .filter_map(|coupon| {
                coupon
                    .reconcile_status(now)
                    .map(|status| (coupon.code.clone(), status))
            })
            .collect();
        changed.sort_by(|a, b| a.0.cmp(&b.0));

        if !changed.is_empty() {
            info!(count = changed.len(), "coupon statuses reconciled");
        }
        Ok(changed)
    }
}

/// Map every reason a coupon cannot be used to a typed error.
fn check(
    coupon: &Coupon,
    customer_usage: u32,
    request: &RedemptionRequest,
    now: DateTime<Utc>,
) -> Result<DiscountResult, CouponError> {
    let code = || coupon.code.clone();

    if coupon.is_expired(now) {
        return Err(CouponError::Expired(code()));
    }
    if now < coupon.valid_from {
        return Err(CouponError::NotYetValid {
            code: code(),
            valid_from: coupon.valid_from,
        });
    }
    if coupon.is_used_up() {
        return Err(CouponError::UsageLimitReached(code()));
    }
    if coupon.status != CouponStatus::Active {
        return Err(CouponError::Inactive {
            code: code(),
            status: coupon.status.to_string(),
        });
    }

    if !coupon.can_be_used_by(&request.user_id, &request.user_role, request.is_first_time, now) {
        return Err(CouponError::NotEligible(code()));
    }

    if !coupon.within_customer_limit(customer_usage) {
        return Err(CouponError::CustomerLimitReached {
            code: code(),
            used: customer_usage,
            limit: coupon.usage_limit_per_customer.unwrap_or(0),
        });
    }

    let result = coupon.calculate_discount(
        request.order_amount,
        request.shipping_amount,
        &request.items,
        now,
    );
    if result.is_zero() {
        return Err(CouponError::NotApplicable(code()));
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;
    use std::thread;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap()
    }

    fn usd(cents: i64) -> Money {
        Money::new(cents, Currency::USD)
    }

    fn coupon(code: &str) -> crate::coupon::CouponBuilder {
        Coupon::percentage(code, 10.0).valid_between(
            Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 6, 30, 0, 0, 0).unwrap(),
        )
    }

    fn request(user: &str) -> RedemptionRequest {
        RedemptionRequest::new(user, "customer", usd(10000), usd(500))
    }

    #[test]
    fn test_insert_rejects_duplicate_codes() {
        let book = CouponBook::new();
        book.insert(coupon("SAVE10").build().unwrap()).unwrap();
        let err = book.insert(coupon("save10").build().unwrap()).unwrap_err();
        assert_eq!(err, CouponError::DuplicateCode("save10".to_string()));
        assert_eq!(book.len().unwrap(), 1);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let book = CouponBook::from_coupons([coupon("SAVE10").build().unwrap()]).unwrap();
        assert!(book.get(" save10 ").unwrap().is_some());
        assert!(book.get("OTHER").unwrap().is_none());
    }

    #[test]
    fn test_quote_does_not_mutate() {
        let book = CouponBook::from_coupons([coupon("SAVE10").build().unwrap()]).unwrap();
        let result = book.quote("SAVE10", &request("u1"), now()).unwrap();
        assert_eq!(result.discount_amount, usd(1000));
        assert_eq!(book.get("SAVE10").unwrap().unwrap().usage_count, 0);
    }

    #[test]
    fn test_quote_errors() {
        let book = CouponBook::from_coupons([
            coupon("LATE").build().unwrap(),
            coupon("OFF").status(CouponStatus::Inactive).build().unwrap(),
            coupon("VIP").applicable_users(["vip"]).build().unwrap(),
            coupon("BIG").min_order(usd(50000)).build().unwrap(),
        ])
        .unwrap();

        assert_eq!(
            book.quote("NOPE", &request("u1"), now()).unwrap_err(),
            CouponError::InvalidCode("NOPE".to_string())
        );
        assert_eq!(
            book.quote("LATE", &request("u1"), now() + Duration::days(30))
                .unwrap_err(),
            CouponError::Expired("LATE".to_string())
        );
        assert!(matches!(
            book.quote("LATE", &request("u1"), now() - Duration::days(30)),
            Err(CouponError::NotYetValid { .. })
        ));
        assert!(matches!(
            book.quote("OFF", &request("u1"), now()),
            Err(CouponError::Inactive { .. })
        ));
        assert_eq!(
            book.quote("VIP", &request("u1"), now()).unwrap_err(),
            CouponError::NotEligible("VIP".to_string())
        );
        assert!(book.quote("VIP", &request("vip"), now()).is_ok());
        assert_eq!(
            book.quote("BIG", &request("u1"), now()).unwrap_err(),
            CouponError::NotApplicable("BIG".to_string())
        );
    }

    #[test]
    fn test_redeem_enforces_total_limit() {
        let book =
            CouponBook::from_coupons([coupon("ONCE").usage_limit(1).build().unwrap()]).unwrap();
        let redemption = book.redeem("ONCE", &request("u1"), now()).unwrap();
        assert_eq!(redemption.usage_count, 1);
        assert_eq!(redemption.discount.discount_amount, usd(1000));

        assert_eq!(
            book.redeem("ONCE", &request("u2"), now()).unwrap_err(),
            CouponError::UsageLimitReached("ONCE".to_string())
        );
        let stored = book.get("ONCE").unwrap().unwrap();
        assert_eq!(stored.status, CouponStatus::UsedUp);
    }

    #[test]
    fn test_redeem_enforces_customer_limit() {
        let book = CouponBook::from_coupons([coupon("TWICE")
            .usage_limit_per_customer(2)
            .build()
            .unwrap()])
        .unwrap();

        book.redeem("TWICE", &request("u1"), now()).unwrap();
        book.redeem("TWICE", &request("u1"), now()).unwrap();
        assert!(matches!(
            book.redeem("TWICE", &request("u1"), now()),
            Err(CouponError::CustomerLimitReached { used: 2, limit: 2, .. })
        ));
        assert!(book.redeem("TWICE", &request("u2"), now()).is_ok());
        assert_eq!(book.customer_usage("TWICE", &UserId::new("u1")).unwrap(), 2);
    }

    #[test]
    fn test_seeded_customer_usage_counts_toward_limit() {
        let book = CouponBook::from_coupons([coupon("LOYAL")
            .usage_limit_per_customer(3)
            .build()
            .unwrap()])
        .unwrap();
        let user = UserId::new("u1");

        book.set_customer_usage("loyal", &user, 3).unwrap();
        assert!(matches!(
            book.quote("LOYAL", &request("u1"), now()),
            Err(CouponError::CustomerLimitReached { used: 3, .. })
        ));
        assert_eq!(
            book.set_customer_usage("MISSING", &user, 1).unwrap_err(),
            CouponError::InvalidCode("MISSING".to_string())
        );
    }

    #[test]
    fn test_release_restores_slot() {
        let book =
            CouponBook::from_coupons([coupon("ONCE").usage_limit(1).build().unwrap()]).unwrap();
        book.redeem("ONCE", &request("u1"), now()).unwrap();
        book.release("ONCE", &UserId::new("u1")).unwrap();

        let stored = book.get("ONCE").unwrap().unwrap();
        assert_eq!(stored.usage_count, 0);
        assert_eq!(stored.status, CouponStatus::Active);
        assert_eq!(book.customer_usage("ONCE", &UserId::new("u1")).unwrap(), 0);
        assert!(book.redeem("ONCE", &request("u2"), now()).is_ok());
    }

    #[test]
    fn test_release_requires_recorded_redemption() {
        let book =
            CouponBook::from_coupons([coupon("ONCE").usage_limit(1).build().unwrap()]).unwrap();
        book.redeem("ONCE", &request("u1"), now()).unwrap();

        assert_eq!(
            book.release("ONCE", &UserId::new("stranger")).unwrap_err(),
            CouponError::NoRedemption {
                code: "ONCE".to_string(),
                user: "stranger".to_string(),
            }
        );
        let stored = book.get("ONCE").unwrap().unwrap();
        assert_eq!(stored.usage_count, 1);
        assert_eq!(stored.status, CouponStatus::UsedUp);
        assert_eq!(book.customer_usage("ONCE", &UserId::new("u1")).unwrap(), 1);
        assert_eq!(
            book.redeem("ONCE", &request("u2"), now()).unwrap_err(),
            CouponError::UsageLimitReached("ONCE".to_string())
        );

        // A second release by the same customer has nothing left to undo.
        book.release("ONCE", &UserId::new("u1")).unwrap();
        assert!(matches!(
            book.release("ONCE", &UserId::new("u1")),
            Err(CouponError::NoRedemption { .. })
        ));
        assert_eq!(book.get("ONCE").unwrap().unwrap().usage_count, 0);
    }

    #[test]
    fn test_redeem_saturates_customer_count() {
        let book = CouponBook::from_coupons([coupon("OPEN").build().unwrap()]).unwrap();
        let user = UserId::new("u1");
        book.set_customer_usage("OPEN", &user, u32::MAX).unwrap();

        let redemption = book.redeem("OPEN", &request("u1"), now()).unwrap();
        assert_eq!(redemption.usage_count, 1);
        assert_eq!(book.customer_usage("OPEN", &user).unwrap(), u32::MAX);
        assert!(book.get("OPEN").unwrap().is_some());
    }

    #[test]
    fn test_concurrent_redemptions_respect_limit() {
        let book = Arc::new(
            CouponBook::from_coupons([coupon("RACE").usage_limit(5).build().unwrap()]).unwrap(),
        );

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let book = Arc::clone(&book);
                thread::spawn(move || {
                    book.redeem("RACE", &request(&format!("u{}", i)), now())
                        .is_ok()
                })
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(successes, 5);
        assert_eq!(book.get("RACE").unwrap().unwrap().usage_count, 5);
    }

    #[test]
    fn test_sweep_marks_expired_and_used_up() {
        let book = CouponBook::from_coupons([
            coupon("FRESH").build().unwrap(),
            coupon("SPENT").usage_limit(1).usage_count(1).build().unwrap(),
            coupon("OLD")
                .valid_between(now() - Duration::days(10), now() - Duration::days(1))
                .build()
                .unwrap(),
        ])
        .unwrap();

        let changed = book.sweep(now()).unwrap();
        assert_eq!(
            changed,
            vec![
                ("OLD".to_string(), CouponStatus::Expired),
                ("SPENT".to_string(), CouponStatus::UsedUp),
            ]
        );
        assert!(book.sweep(now()).unwrap().is_empty());
    }

    #[test]
    fn test_remove() {
        let book = CouponBook::from_coupons([coupon("GONE").build().unwrap()]).unwrap();
        book.redeem("GONE", &request("u1"), now()).unwrap();
        assert!(book.remove("gone").unwrap().is_some());
        assert!(book.is_empty().unwrap());
        assert_eq!(book.customer_usage("GONE", &UserId::new("u1")).unwrap(), 0);
    }
}
