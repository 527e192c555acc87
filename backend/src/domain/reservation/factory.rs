//! Validated construction of new reservations.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::UserId;

use super::{
    Coupon, HourlyRatePriceCalculator, Money, Note, PriceCalculator, Reservation,
    ReservationStatus, ReservationValidationError, Resource, TimeSlot,
};

/// Inputs for [`ReservationFactory::create`].
#[derive(Debug, Clone)]
pub struct ReservationDraft<'a> {
    pub resource: &'a Resource,
    pub user_id: UserId,
    pub time_slot: TimeSlot,
    pub coupon: Option<&'a Coupon>,
    pub note: Note,
}

/// Builds reservations that satisfy every creation-time invariant.
///
/// Pure: performs no I/O and reads time only from the `now` argument.
#[derive(Clone)]
pub struct ReservationFactory {
    calculator: Arc<dyn PriceCalculator>,
}

impl ReservationFactory {
    /// Create a factory using the given pricing strategy.
    pub fn new(calculator: Arc<dyn PriceCalculator>) -> Self {
        Self { calculator }
    }

    /// Validate the draft and produce a confirmed reservation.
    ///
    /// Steps, in order: lead time, base price, coupon window, discount.
    ///
    /// # Errors
    ///
    /// - [`ReservationValidationError::LeadTimeNotMet`] when the slot starts
    ///   too soon.
    /// - [`ReservationValidationError::NegativePrice`] or
    ///   [`ReservationValidationError::PriceOutOfRange`] when the strategy
    ///   returns an unusable amount.
    /// - [`ReservationValidationError::InvalidCoupon`] when the coupon is not
    ///   valid at `now`.
    pub fn create(
        &self,
        draft: ReservationDraft<'_>,
        now: DateTime<Utc>,
    ) -> Result<Reservation, ReservationValidationError> {
        let ReservationDraft {
            resource,
            user_id,
            time_slot,
            coupon,
            note,
        } = draft;

        time_slot.validate_lead_time(now, resource.effective_lead_time_minutes())?;

        let base = self
            .calculator
            .base_price(&resource.price_context(), &time_slot);
        let mut price = Money::from_cents(base)?;

        if let Some(coupon) = coupon {
            coupon.validate_at(now)?;
            price = coupon.apply_to(price);
        }

        Ok(Reservation {
            id: Uuid::new_v4(),
            resource_id: resource.id,
            user_id,
            time_slot,
            status: ReservationStatus::Confirmed,
            price,
            coupon_id: coupon.map(|coupon| coupon.id),
            note,
            created_at: now,
            updated_at: now,
        })
    }
}

impl Default for ReservationFactory {
    fn default() -> Self {
        Self::new(Arc::new(HourlyRatePriceCalculator))
    }
}
