//! Price calculation strategies.

use super::{ResourcePriceContext, TimeSlot};

const MILLIS_PER_HOUR: i128 = 3_600_000;

/// Computes the undiscounted price of a slot, in cents.
///
/// Implementations return a raw signed amount; the reservation factory
/// rejects negative and out-of-range results.
#[cfg_attr(test, mockall::automock)]
pub trait PriceCalculator: Send + Sync {
    /// Base price for booking `slot` on the resource described by `context`.
    fn base_price(&self, context: &ResourcePriceContext, slot: &TimeSlot) -> i64;
}

/// Charges `hourly_rate_cents` per hour of slot duration.
///
/// Fractional hours are charged proportionally and the result is truncated to
/// whole cents. The computation is exact integer arithmetic on milliseconds.
///
/// # Example
///
/// ```
/// # use chrono::{Duration, TimeZone, Utc};
/// # use reservations::domain::reservation::{HourlyRatePriceCalculator, PriceCalculator, ResourcePriceContext, TimeSlot};
/// # use uuid::Uuid;
/// let start = Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap();
/// let slot = TimeSlot::new(start, start + Duration::minutes(90)).unwrap();
/// let context = ResourcePriceContext { resource_id: Uuid::nil(), hourly_rate_cents: 1_000 };
/// assert_eq!(HourlyRatePriceCalculator.base_price(&context, &slot), 1_500);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct HourlyRatePriceCalculator;

impl PriceCalculator for HourlyRatePriceCalculator {
    fn base_price(&self, context: &ResourcePriceContext, slot: &TimeSlot) -> i64 {
        let millis = i128::from(slot.duration().num_milliseconds());
        let cents = millis * i128::from(context.hourly_rate_cents) / MILLIS_PER_HOUR;
        i64::try_from(cents).unwrap_or(if cents.is_negative() { i64::MIN } else { i64::MAX })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rstest::rstest;
    use uuid::Uuid;

    fn slot_of(duration: Duration) -> TimeSlot {
        let start: DateTime<Utc> = Utc
            .with_ymd_and_hms(2026, 1, 5, 10, 0, 0)
            .single()
            .expect("valid fixture timestamp");
        TimeSlot::new(start, start + duration).expect("valid slot")
    }

    fn context(rate: i32) -> ResourcePriceContext {
        ResourcePriceContext {
            resource_id: Uuid::new_v4(),
            hourly_rate_cents: rate,
        }
    }

    #[rstest]
    #[case(Duration::hours(2), 1_250, 2_500)]
    #[case(Duration::minutes(30), 1_000, 500)]
    #[case(Duration::minutes(20), 1_000, 333)]
    #[case(Duration::seconds(1), 999, 0)]
    #[case(Duration::minutes(90), 0, 0)]
    fn hourly_rate_uses_fractional_hours_truncated(
        #[case] duration: Duration,
        #[case] rate: i32,
        #[case] expected: i64,
    ) {
        assert_eq!(
            HourlyRatePriceCalculator.base_price(&context(rate), &slot_of(duration)),
            expected
        );
    }

    #[rstest]
    fn negative_rate_produces_negative_price() {
        let price = HourlyRatePriceCalculator.base_price(&context(-100), &slot_of(Duration::hours(1)));
        assert_eq!(price, -100);
    }
}
