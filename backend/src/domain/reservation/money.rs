//! Minor-unit money amounts and discount arithmetic.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ReservationValidationError;

/// A non-negative amount of money in minor units (cents).
///
/// The upper bound is `i32::MAX` because prices are persisted as a 32-bit
/// signed integer column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Money(i32);

impl Money {
    /// Zero cents.
    pub const ZERO: Self = Self(0);

    /// Validate a raw cent amount.
    ///
    /// # Errors
    ///
    /// [`ReservationValidationError::NegativePrice`] for negative input and
    /// [`ReservationValidationError::PriceOutOfRange`] above `i32::MAX`.
    ///
    /// # Example
    ///
    /// ```
    /// # use reservations::domain::reservation::Money;
    /// let price = Money::from_cents(1_500).expect("valid amount");
    /// assert_eq!(price.cents(), 1_500);
    /// assert!(Money::from_cents(-1).is_err());
    /// ```
    pub fn from_cents(cents: i64) -> Result<Self, ReservationValidationError> {
        if cents < 0 {
            return Err(ReservationValidationError::NegativePrice { cents });
        }
        i32::try_from(cents)
            .map(Self)
            .map_err(|_| ReservationValidationError::PriceOutOfRange { cents })
    }

    /// Rebuild from a stored column value without re-validating the sign.
    ///
    /// Storage carries a `CHECK (price_cents >= 0)` constraint; negative
    /// values are clamped rather than rejected so rehydration never fails.
    pub fn from_stored(cents: i32) -> Self {
        Self(cents.max(0))
    }

    /// The amount in cents.
    pub fn cents(self) -> i32 {
        self.0
    }

    /// Apply a coupon-style discount to this amount.
    ///
    /// See [`apply_discount`] for the ordering and rounding rules.
    pub fn apply_discount(self, amount_off_cents: Option<i64>, percent_off: Option<u8>) -> Self {
        apply_discount(self, amount_off_cents, percent_off)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} cents", self.0)
    }
}

impl From<Money> for i64 {
    fn from(value: Money) -> Self {
        Self::from(value.0)
    }
}

impl TryFrom<i64> for Money {
    type Error = ReservationValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::from_cents(value)
    }
}

/// Apply a fixed amount and then a percentage discount to `base`.
///
/// The fixed amount is subtracted first. The percentage is then applied as
/// `floor(remaining * (100 - pct) / 100)`. The remaining amount may be
/// negative between the two steps; only the final result is clamped to zero.
/// Negative fixed amounts are ignored and percentages are capped at 100 so a
/// discount can never raise the price.
///
/// # Example
///
/// ```
/// # use reservations::domain::reservation::{Money, apply_discount};
/// let base = Money::from_cents(1_000).expect("valid amount");
/// assert_eq!(apply_discount(base, Some(200), Some(10)).cents(), 720);
/// assert_eq!(apply_discount(base, Some(5_000), None), Money::ZERO);
/// ```
pub fn apply_discount(base: Money, amount_off_cents: Option<i64>, percent_off: Option<u8>) -> Money {
    let mut remaining = i64::from(base.0);

    if let Some(amount) = amount_off_cents {
        remaining = remaining.saturating_sub(amount.max(0));
    }

    if let Some(pct) = percent_off {
        let keep = 100 - i64::from(pct.min(100));
        remaining = remaining.saturating_mul(keep).div_euclid(100);
    }

    // The result never exceeds `base`, so the conversion cannot fail.
    i32::try_from(remaining.max(0)).map_or(base, Money)
}
