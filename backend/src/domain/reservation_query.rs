//! Read-side reservation service.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::ports::ReservationRepository;
use crate::domain::reservation::{ReservationListItem, ReservationView};
use crate::domain::reservation_service_support::map_reservation_read_error;
use crate::domain::{Error, Requester, UserId};

/// Serves reservation views to their owners.
#[derive(Clone)]
pub struct ReservationQueryService<V> {
    reservations: Arc<V>,
}

impl<V> ReservationQueryService<V> {
    pub fn new(reservations: Arc<V>) -> Self {
        Self { reservations }
    }
}

impl<V> ReservationQueryService<V>
where
    V: ReservationRepository,
{
    /// Fetch one reservation owned by `requester`.
    ///
    /// Reservations belonging to someone else read as not found so their
    /// existence is not disclosed.
    ///
    /// # Errors
    ///
    /// `ReservationNotFound` when the id is unknown or not owned by the
    /// requester; `DatabaseOperationFailed` for storage failures.
    pub async fn get(&self, id: Uuid, requester: &Requester) -> Result<ReservationView, Error> {
        self.reservations
            .find_by_id(id)
            .await
            .map_err(map_reservation_read_error)?
            .filter(|view| &view.user_id == requester.user_id())
            .ok_or_else(|| Error::reservation_not_found(id))
    }

    /// List every reservation of `user_id`.
    ///
    /// # Errors
    ///
    /// `DatabaseOperationFailed` for storage failures.
    pub async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<ReservationListItem>, Error> {
        self.reservations
            .find_by_user_id(user_id)
            .await
            .map_err(map_reservation_read_error)
    }
}
