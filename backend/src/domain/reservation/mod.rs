//! Reservation aggregate, its value objects, and pricing.
//!
//! Everything here is pure domain logic: no I/O and no ambient clock. Callers
//! pass `now` explicitly so lead-time and coupon-window boundaries can be
//! tested deterministically.

use chrono::{DateTime, Utc};
use uuid::Uuid;

mod aggregate;
mod coupon;
mod factory;
mod money;
mod note;
mod pricing;
mod resource;
mod time_slot;
mod view;

pub use aggregate::{
    ParseReservationStatusError, Reservation, ReservationSnapshot, ReservationStatus,
};
pub use coupon::Coupon;
pub use factory::{ReservationDraft, ReservationFactory};
pub use money::{Money, apply_discount};
pub use note::{NOTE_MAX_CHARS, Note};
#[cfg(test)]
pub use pricing::MockPriceCalculator;
pub use pricing::{HourlyRatePriceCalculator, PriceCalculator};
pub use resource::{Resource, ResourcePriceContext};
pub use time_slot::TimeSlot;
pub use view::{CouponSummary, ReservationListItem, ReservationView, ResourceSummary};

/// Client-fixable validation failures raised while building reservations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReservationValidationError {
    #[error("time slot start {start} must be before end {end}")]
    InvalidTimeSlot {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("slot starting at {start} does not meet the {lead_time_minutes} minute lead time")]
    LeadTimeNotMet {
        lead_time_minutes: i64,
        start: DateTime<Utc>,
    },
    #[error("price must not be negative (got {cents} cents)")]
    NegativePrice { cents: i64 },
    #[error("price of {cents} cents exceeds the supported range")]
    PriceOutOfRange { cents: i64 },
    #[error("coupon {code} is not valid at this time")]
    InvalidCoupon { code: String },
    #[error("note must be at most {max} characters (got {actual})")]
    NoteTooLong { max: usize, actual: usize },
    #[error("reservation {id} is already canceled")]
    ReservationCanceled { id: Uuid },
}
