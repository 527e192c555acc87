//! Internal helpers shared by the reservation services.
//!
//! Port errors never leak driver text to callers: infrastructure failures are
//! logged here and surfaced as opaque [`ErrorCode::DatabaseOperationFailed`]
//! errors with the port error kept as the source.
//!
//! [`ErrorCode::DatabaseOperationFailed`]: crate::domain::ErrorCode::DatabaseOperationFailed

use chrono::{DateTime, TimeDelta, Utc};
use tracing::error;

use crate::domain::ports::{
    CouponRepositoryError, IdempotencyRepositoryError, ReservationRepositoryError,
    ReservationUnitOfWorkError, ResourceRepositoryError,
};
use crate::domain::{Error, Phase};

fn infrastructure<E>(port: &'static str, phase: Phase, source: E) -> Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    error!(port, %phase, error = %source, "reservation storage call failed");
    Error::database_operation_failed()
        .with_phase(phase)
        .with_source(source)
}

pub(crate) fn map_resource_error(error: ResourceRepositoryError) -> Error {
    infrastructure("resources", Phase::DomainConstruction, error)
}

pub(crate) fn map_coupon_error(error: CouponRepositoryError) -> Error {
    infrastructure("coupons", Phase::DomainConstruction, error)
}

pub(crate) fn map_reservation_read_error(error: ReservationRepositoryError) -> Error {
    infrastructure("reservations", Phase::DatabaseOperation, error)
}

pub(crate) fn map_idempotency_error(error: IdempotencyRepositoryError) -> Error {
    infrastructure("idempotency", Phase::IdempotencyCheck, error)
}

pub(crate) fn map_unit_of_work_error(error: ReservationUnitOfWorkError) -> Error {
    match error {
        ReservationUnitOfWorkError::Overlap { .. } => Error::reservation_conflict()
            .with_phase(Phase::DatabaseOperation)
            .with_source(error),
        ReservationUnitOfWorkError::Constraint { .. } => Error::storage_constraint_violation()
            .with_phase(Phase::DatabaseOperation)
            .with_source(error),
        ReservationUnitOfWorkError::ClaimLost { .. } => {
            Error::duplicate_reservation("idempotency key was claimed by another request")
                .with_phase(Phase::DatabaseOperation)
                .with_source(error)
        }
        ReservationUnitOfWorkError::Connection { .. } | ReservationUnitOfWorkError::Query { .. } => {
            infrastructure("reservation transaction", Phase::DatabaseOperation, error)
        }
    }
}

/// `now + ttl`, failing only for TTLs chrono cannot represent.
pub(crate) fn expiry_after(
    now: DateTime<Utc>,
    ttl: std::time::Duration,
) -> Result<DateTime<Utc>, Error> {
    TimeDelta::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| {
            Error::internal("idempotency ttl is out of range").with_phase(Phase::IdempotencyCheck)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ErrorCode, ErrorKind};
    use rstest::rstest;
    use std::error::Error as _;

    #[rstest]
    #[case(ReservationUnitOfWorkError::overlap("reservations_no_overlap"), ErrorCode::ReservationConflict)]
    #[case(ReservationUnitOfWorkError::constraint("fk"), ErrorCode::StorageConstraintViolation)]
    #[case(ReservationUnitOfWorkError::claim_lost("k"), ErrorCode::DuplicateReservation)]
    #[case(ReservationUnitOfWorkError::query("syntax error at or near"), ErrorCode::DatabaseOperationFailed)]
    fn unit_of_work_errors_map_to_codes(
        #[case] error: ReservationUnitOfWorkError,
        #[case] expected: ErrorCode,
    ) {
        let mapped = map_unit_of_work_error(error);
        assert_eq!(mapped.code(), expected);
        assert_eq!(mapped.phase(), Some(Phase::DatabaseOperation));
        assert!(mapped.source().is_some());
    }

    #[rstest]
    fn infrastructure_errors_hide_driver_text() {
        let mapped = map_idempotency_error(IdempotencyRepositoryError::query(
            "relation \"idempotency_records\" does not exist",
        ));
        assert!(mapped.is_kind(ErrorKind::Infrastructure));
        assert!(!mapped.to_string().contains("idempotency_records"));
        assert_eq!(mapped.phase(), Some(Phase::IdempotencyCheck));
    }

    #[rstest]
    fn expiry_adds_ttl() {
        let now = Utc::now();
        let expires = expiry_after(now, std::time::Duration::from_secs(3600)).expect("in range");
        assert_eq!(expires - now, TimeDelta::hours(1));
    }
}
