//! Notification jobs enqueued alongside reservation writes.
//!
//! Delivery happens elsewhere; this crate only records the job in the same
//! transaction as the reservation so a committed booking always has one.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::reservation::{Reservation, Resource};
use super::user::Requester;

/// Kind discriminator stored in `notification_jobs.kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    ReservationCreated,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReservationCreated => "reservation.created",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown job kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid notification job kind '{input}'")]
pub struct ParseJobKindError {
    pub input: String,
}

impl FromStr for JobKind {
    type Err = ParseJobKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reservation.created" => Ok(Self::ReservationCreated),
            other => Err(ParseJobKindError {
                input: other.to_owned(),
            }),
        }
    }
}

/// Payload of a [`JobKind::ReservationCreated`] job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationCreatedPayload {
    pub reservation_id: Uuid,
    pub user_email: String,
    pub resource_name: String,
    pub slot_start: DateTime<Utc>,
    pub slot_end: DateTime<Utc>,
}

impl ReservationCreatedPayload {
    /// Collect the fields a confirmation message needs.
    pub fn new(reservation: &Reservation, resource: &Resource, requester: &Requester) -> Self {
        Self {
            reservation_id: reservation.id(),
            user_email: requester.email().to_owned(),
            resource_name: resource.name.clone(),
            slot_start: reservation.time_slot().start(),
            slot_end: reservation.time_slot().end(),
        }
    }
}

/// A job row to insert into `notification_jobs`.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationJob {
    pub id: Uuid,
    pub kind: JobKind,
    pub payload: serde_json::Value,
    pub run_at: DateTime<Utc>,
}

impl NotificationJob {
    /// Build a `reservation.created` job due at `run_at`.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if the payload cannot be encoded.
    pub fn reservation_created(
        payload: &ReservationCreatedPayload,
        run_at: DateTime<Utc>,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: Uuid::new_v4(),
            kind: JobKind::ReservationCreated,
            payload: serde_json::to_value(payload)?,
            run_at,
        })
    }
}
