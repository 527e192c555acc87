//! Driven port for the reservation write transaction.

use async_trait::async_trait;

use crate::domain::idempotency::IdempotencyCompletion;
use crate::domain::notification::NotificationJob;
use crate::domain::reservation::Reservation;

use super::define_port_error;

/// Everything written when a reservation is created.
#[derive(Debug, Clone, PartialEq)]
pub struct ReservationCommit {
    pub reservation: Reservation,
    pub notification: NotificationJob,
    pub completion: IdempotencyCompletion,
}

define_port_error! {
    /// Errors raised while committing a reservation.
    pub enum ReservationUnitOfWorkError {
        /// Connection could not be established or the pool timed out.
        Connection { message: String } => "reservation transaction connection failed: {message}",
        /// A statement or the commit itself failed.
        Query { message: String } => "reservation transaction failed: {message}",
        /// The slot overlaps a confirmed reservation on the same resource.
        Overlap { message: String } => "reservation slot overlaps an existing booking: {message}",
        /// A unique or foreign-key constraint rejected a write.
        Constraint { message: String } => "reservation write violated a constraint: {message}",
        /// The idempotency record was no longer ours to complete.
        ClaimLost { key: String } => "idempotency claim for key {key} was lost before commit",
    }
}

/// Transaction manager for reservation creation.
///
/// Implementations open one transaction and, inside it, insert the
/// reservation, insert the notification job, and mark the idempotency record
/// completed. Any failure rolls back all three writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReservationUnitOfWork: Send + Sync {
    async fn commit(&self, commit: &ReservationCommit) -> Result<(), ReservationUnitOfWorkError>;
}

/// Fixture implementation that accepts every commit without storing it.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureReservationUnitOfWork;

#[async_trait]
impl ReservationUnitOfWork for FixtureReservationUnitOfWork {
    async fn commit(&self, _commit: &ReservationCommit) -> Result<(), ReservationUnitOfWorkError> {
        Ok(())
    }
}
