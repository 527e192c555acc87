//! Driven port for reservation read models.
//!
//! Writes go through [`super::ReservationUnitOfWork`]; this port only serves
//! the projections returned to clients.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::UserId;
use crate::domain::reservation::{ReservationListItem, ReservationView};

use super::define_port_error;

define_port_error! {
    /// Errors raised by reservation read adapters.
    pub enum ReservationRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "reservation repository connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } => "reservation repository query failed: {message}",
        /// A stored row could not be mapped to a view.
        Decode { message: String } => "reservation repository returned an invalid row: {message}",
    }
}

/// Read access to stored reservations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Load the full view of one reservation, joined with its resource and
    /// coupon.
    async fn find_by_id(&self, id: Uuid)
    -> Result<Option<ReservationView>, ReservationRepositoryError>;

    /// List a user's reservations, most recent slot first.
    async fn find_by_user_id(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ReservationListItem>, ReservationRepositoryError>;
}

/// Fixture implementation with no stored reservations.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureReservationRepository;

#[async_trait]
impl ReservationRepository for FixtureReservationRepository {
    async fn find_by_id(
        &self,
        _id: Uuid,
    ) -> Result<Option<ReservationView>, ReservationRepositoryError> {
        Ok(None)
    }

    async fn find_by_user_id(
        &self,
        _user_id: &UserId,
    ) -> Result<Vec<ReservationListItem>, ReservationRepositoryError> {
        Ok(Vec::new())
    }
}
