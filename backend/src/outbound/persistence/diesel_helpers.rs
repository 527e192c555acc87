//! Shared helpers for the reservation write path.
//!
//! Classifies Diesel failures raised inside the reservation transaction. The
//! overlap check lives in the `reservations_no_overlap` exclusion constraint,
//! so it is recognised by constraint name rather than by error kind.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::{debug, warn};

use crate::domain::ports::ReservationUnitOfWorkError;

use super::pool::PoolError;

/// Name of the exclusion constraint that forbids overlapping confirmed slots.
pub const NO_OVERLAP_CONSTRAINT: &str = "reservations_no_overlap";

/// Extract a readable message from a pool error.
pub fn map_pool_error_message(error: PoolError) -> String {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    }
}

fn is_overlap(constraint_name: Option<&str>, message: &str) -> bool {
    constraint_name == Some(NO_OVERLAP_CONSTRAINT)
        || message.contains(NO_OVERLAP_CONSTRAINT)
        || message.contains("violates exclusion constraint")
}

/// Map a failure raised inside the reservation transaction.
pub fn map_write_error(error: DieselError) -> ReservationUnitOfWorkError {
    match error {
        DieselError::DatabaseError(kind, info) => {
            let constraint = info.constraint_name();
            debug!(?kind, constraint, message = info.message(), "reservation write failed");
            if is_overlap(constraint, info.message()) {
                return ReservationUnitOfWorkError::overlap(NO_OVERLAP_CONSTRAINT);
            }
            match kind {
                DatabaseErrorKind::UniqueViolation | DatabaseErrorKind::ForeignKeyViolation => {
                    ReservationUnitOfWorkError::constraint(constraint.unwrap_or("unnamed constraint"))
                }
                DatabaseErrorKind::ClosedConnection => {
                    ReservationUnitOfWorkError::connection("database connection error")
                }
                DatabaseErrorKind::SerializationFailure => {
                    warn!("reservation transaction hit a serialization failure");
                    ReservationUnitOfWorkError::query("serialization failure")
                }
                _ => ReservationUnitOfWorkError::query("database error"),
            }
        }
        DieselError::RollbackTransaction => ReservationUnitOfWorkError::query("transaction rolled back"),
        other => {
            debug!(
                error_type = %std::any::type_name_of_val(&other),
                "reservation write failed"
            );
            ReservationUnitOfWorkError::query("database error")
        }
    }
}

/// Convert an affected-row count to the `u64` the ports expose.
pub fn affected_rows(count: usize) -> u64 {
    u64::try_from(count).unwrap_or(u64::MAX)
}
