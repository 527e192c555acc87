//! The reservation aggregate root.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::UserId;

use super::{Money, Note, ReservationValidationError, TimeSlot};

/// Lifecycle state of a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Confirmed,
    Canceled,
}

impl ReservationStatus {
    /// Database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Canceled => "canceled",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown reservation status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid reservation status '{input}': expected confirmed or canceled")]
pub struct ParseReservationStatusError {
    pub input: String,
}

impl FromStr for ReservationStatus {
    type Err = ParseReservationStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(Self::Confirmed),
            "canceled" => Ok(Self::Canceled),
            other => Err(ParseReservationStatusError {
                input: other.to_owned(),
            }),
        }
    }
}

/// Persisted field set of a [`Reservation`].
///
/// This is the only input accepted by [`Reservation::rehydrate`], which
/// trusts storage and skips the creation-time checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationSnapshot {
    pub id: Uuid,
    pub resource_id: Uuid,
    pub user_id: UserId,
    pub time_slot: TimeSlot,
    pub status: ReservationStatus,
    pub price: Money,
    pub coupon_id: Option<Uuid>,
    pub note: Note,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A booked slot on a resource.
///
/// New reservations come only from
/// [`ReservationFactory::create`](super::ReservationFactory::create).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub(super) id: Uuid,
    pub(super) resource_id: Uuid,
    pub(super) user_id: UserId,
    pub(super) time_slot: TimeSlot,
    pub(super) status: ReservationStatus,
    pub(super) price: Money,
    pub(super) coupon_id: Option<Uuid>,
    pub(super) note: Note,
    pub(super) created_at: DateTime<Utc>,
    pub(super) updated_at: DateTime<Utc>,
}

impl Reservation {
    /// Rebuild a reservation loaded from storage.
    pub fn rehydrate(snapshot: ReservationSnapshot) -> Self {
        let ReservationSnapshot {
            id,
            resource_id,
            user_id,
            time_slot,
            status,
            price,
            coupon_id,
            note,
            created_at,
            updated_at,
        } = snapshot;
        Self {
            id,
            resource_id,
            user_id,
            time_slot,
            status,
            price,
            coupon_id,
            note,
            created_at,
            updated_at,
        }
    }

    /// Copy out every persisted field.
    pub fn snapshot(&self) -> ReservationSnapshot {
        ReservationSnapshot {
            id: self.id,
            resource_id: self.resource_id,
            user_id: self.user_id.clone(),
            time_slot: self.time_slot,
            status: self.status,
            price: self.price,
            coupon_id: self.coupon_id,
            note: self.note.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn resource_id(&self) -> Uuid {
        self.resource_id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn time_slot(&self) -> &TimeSlot {
        &self.time_slot
    }

    pub fn status(&self) -> ReservationStatus {
        self.status
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn coupon_id(&self) -> Option<Uuid> {
        self.coupon_id
    }

    pub fn note(&self) -> &Note {
        &self.note
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Move a confirmed reservation to `canceled`.
    ///
    /// Cancellation is one-way: a second call fails with
    /// [`ReservationValidationError::ReservationCanceled`].
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), ReservationValidationError> {
        if self.status == ReservationStatus::Canceled {
            return Err(ReservationValidationError::ReservationCanceled { id: self.id });
        }
        self.status = ReservationStatus::Canceled;
        self.updated_at = now;
        Ok(())
    }
}
