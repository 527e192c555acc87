//! Half-open reservation time slots.

use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use super::ReservationValidationError;

/// A bookable interval `[start, end)` with `start < end`.
///
/// # Example
///
/// ```
/// # use chrono::{Duration, TimeZone, Utc};
/// # use reservations::domain::reservation::TimeSlot;
/// let start = Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap();
/// let slot = TimeSlot::new(start, start + Duration::hours(2)).expect("valid slot");
/// assert_eq!(slot.duration(), Duration::hours(2));
/// assert!(TimeSlot::new(start, start).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSlot {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeSlot {
    /// Build a slot, rejecting empty and inverted intervals.
    ///
    /// Both bounds are truncated to whole microseconds first, the precision
    /// `tstzrange` stores, so a slot read back from the database equals the
    /// one written.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ReservationValidationError> {
        let start = start.trunc_subsecs(6);
        let end = end.trunc_subsecs(6);
        if start >= end {
            return Err(ReservationValidationError::InvalidTimeSlot { start, end });
        }
        Ok(Self { start, end })
    }

    /// Inclusive lower bound.
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Exclusive upper bound.
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// `end - start`; always positive.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Whether two slots share any instant under half-open semantics.
    ///
    /// Back-to-back slots (`a.end == b.start`) do not overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// True iff the slot starts strictly after `now + lead_time_minutes`.
    ///
    /// A slot starting exactly on the boundary does not qualify.
    pub fn meets_lead_time(&self, now: DateTime<Utc>, lead_time_minutes: i64) -> bool {
        self.start > now + Duration::minutes(lead_time_minutes)
    }

    /// Fail with [`ReservationValidationError::LeadTimeNotMet`] unless
    /// [`Self::meets_lead_time`] holds.
    pub fn validate_lead_time(
        &self,
        now: DateTime<Utc>,
        lead_time_minutes: i64,
    ) -> Result<(), ReservationValidationError> {
        if self.meets_lead_time(now, lead_time_minutes) {
            return Ok(());
        }
        Err(ReservationValidationError::LeadTimeNotMet {
            lead_time_minutes,
            start: self.start,
        })
    }

    /// Render the PostgreSQL range literal `[start,end)` with RFC 3339
    /// instants.
    pub fn to_range_literal(&self) -> String {
        format!(
            "[{},{})",
            self.start.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            self.end.to_rfc3339_opts(SecondsFormat::AutoSi, true)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    #[fixture]
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0)
            .single()
            .expect("valid fixture timestamp")
    }

    fn slot(start: DateTime<Utc>, minutes: i64) -> TimeSlot {
        TimeSlot::new(start, start + Duration::minutes(minutes)).expect("valid slot")
    }

    #[rstest]
    fn bounds_are_truncated_to_microseconds(now: DateTime<Utc>) {
        let start = now + Duration::nanoseconds(1_234_567);
        let slot = TimeSlot::new(start, start + Duration::hours(1)).expect("valid slot");

        assert_eq!(slot.start(), now + Duration::microseconds(1_234));
        assert_eq!(slot.end(), now + Duration::hours(1) + Duration::microseconds(1_234));
    }

    #[rstest]
    fn interval_shorter_than_a_microsecond_is_empty(now: DateTime<Utc>) {
        let start = now + Duration::nanoseconds(100);
        assert!(TimeSlot::new(start, start + Duration::nanoseconds(500)).is_err());
    }

    #[rstest]
    #[case(-60, false)]
    #[case(0, false)]
    #[case(1, true)]
    fn construction_requires_start_before_end(
        now: DateTime<Utc>,
        #[case] offset_minutes: i64,
        #[case] valid: bool,
    ) {
        let result = TimeSlot::new(now, now + Duration::minutes(offset_minutes));
        assert_eq!(result.is_ok(), valid);
        if !valid {
            assert!(matches!(
                result,
                Err(ReservationValidationError::InvalidTimeSlot { .. })
            ));
        }
    }

    #[rstest]
    #[case(59, false)]
    #[case(60, false)]
    #[case(61, true)]
    fn lead_time_boundary_is_strict(
        now: DateTime<Utc>,
        #[case] start_offset_minutes: i64,
        #[case] meets: bool,
    ) {
        let candidate = slot(now + Duration::minutes(start_offset_minutes), 30);
        assert_eq!(candidate.meets_lead_time(now, 60), meets);
        assert_eq!(candidate.validate_lead_time(now, 60).is_ok(), meets);
    }

    #[rstest]
    fn lead_time_failure_reports_policy(now: DateTime<Utc>) {
        let candidate = slot(now + Duration::minutes(30), 60);
        let err = candidate
            .validate_lead_time(now, 60)
            .expect_err("slot is too soon");
        assert!(matches!(
            err,
            ReservationValidationError::LeadTimeNotMet {
                lead_time_minutes: 60,
                ..
            }
        ));
    }

    #[rstest]
    fn overlap_uses_half_open_bounds(now: DateTime<Utc>) {
        let first = slot(now, 60);
        let adjacent = slot(now + Duration::minutes(60), 60);
        let inside = slot(now + Duration::minutes(15), 15);
        let straddling = slot(now + Duration::minutes(45), 60);

        assert!(!first.overlaps(&adjacent));
        assert!(!adjacent.overlaps(&first));
        assert!(first.overlaps(&inside));
        assert!(first.overlaps(&straddling));
        assert!(first.overlaps(&first));
    }

    #[rstest]
    fn range_literal_is_half_open_rfc3339(now: DateTime<Utc>) {
        let literal = slot(now, 90).to_range_literal();
        assert_eq!(literal, "[2026-03-10T12:00:00Z,2026-03-10T13:30:00Z)");
    }
}
