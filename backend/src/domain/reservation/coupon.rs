//! Coupons: read-only discount policies applied at reservation time.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Money, ReservationValidationError, apply_discount};

/// Discount policy loaded per request by its public code.
///
/// Either discount may be absent. When both are present the fixed amount is
/// applied before the percentage. A missing window bound is unbounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coupon {
    pub id: Uuid,
    pub code: String,
    pub amount_off_cents: Option<i64>,
    pub percent_off: Option<u8>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_to: Option<DateTime<Utc>>,
}

impl Coupon {
    /// Whether `now` lies within `[valid_from, valid_to]`, both ends
    /// inclusive.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        let started = self.valid_from.is_none_or(|from| now >= from);
        let not_ended = self.valid_to.is_none_or(|to| now <= to);
        started && not_ended
    }

    /// Fail with [`ReservationValidationError::InvalidCoupon`] outside the
    /// validity window.
    pub fn validate_at(&self, now: DateTime<Utc>) -> Result<(), ReservationValidationError> {
        if self.is_valid_at(now) {
            return Ok(());
        }
        Err(ReservationValidationError::InvalidCoupon {
            code: self.code.clone(),
        })
    }

    /// Discounted price for `base`.
    pub fn apply_to(&self, base: Money) -> Money {
        apply_discount(base, self.amount_off_cents, self.percent_off)
    }
}
