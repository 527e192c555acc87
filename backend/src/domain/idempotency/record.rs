//! Stored idempotency records and the claim state machine.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::super::UserId;
use super::{IdempotencyKey, IdempotentEndpoint, PayloadHash};

/// Lifecycle state of an idempotency record.
///
/// `absent → processing → completed`; expiry returns a key to `absent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdempotencyStatus {
    Processing,
    Completed,
}

impl IdempotencyStatus {
    /// Database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for IdempotencyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown idempotency status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid idempotency status '{input}'")]
pub struct ParseIdempotencyStatusError {
    pub input: String,
}

impl FromStr for IdempotencyStatus {
    type Err = ParseIdempotencyStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            other => Err(ParseIdempotencyStatusError {
                input: other.to_owned(),
            }),
        }
    }
}

/// Stored idempotency record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdempotencyRecord {
    pub key: IdempotencyKey,
    pub user_id: UserId,
    pub endpoint: IdempotentEndpoint,
    pub request_hash: PayloadHash,
    pub status: IdempotencyStatus,
    pub response_body_hash: Option<PayloadHash>,
    pub result_reservation_id: Option<Uuid>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// How an incoming request relates to an existing live record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordResolution {
    /// Same request already finished; replay its result.
    Completed { reservation_id: Uuid },
    /// Same request is still being processed by another worker.
    InFlight,
}

/// Protocol violations detected while resolving an existing record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdempotencyProtocolError {
    /// The key was reused for a different request body.
    #[error("idempotency key {key} was already used with a different request")]
    PayloadMismatch { key: IdempotencyKey },
    /// A completed record lacks its result reference.
    #[error("completed idempotency record {key} has no result reservation")]
    CompletedWithoutResult { key: IdempotencyKey },
}

impl IdempotencyRecord {
    /// Whether the record has expired at `now` and must be treated as
    /// absent.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Decide what a request with `request_hash` should do given this
    /// record.
    ///
    /// # Errors
    ///
    /// [`IdempotencyProtocolError::PayloadMismatch`] when the hashes differ
    /// and [`IdempotencyProtocolError::CompletedWithoutResult`] when a
    /// completed record is missing its reservation id.
    pub fn resolve(&self, request_hash: &PayloadHash) -> Result<RecordResolution, IdempotencyProtocolError> {
        if self.request_hash != *request_hash {
            return Err(IdempotencyProtocolError::PayloadMismatch {
                key: self.key.clone(),
            });
        }
        match self.status {
            IdempotencyStatus::Processing => Ok(RecordResolution::InFlight),
            IdempotencyStatus::Completed => self
                .result_reservation_id
                .map(|reservation_id| RecordResolution::Completed { reservation_id })
                .ok_or_else(|| IdempotencyProtocolError::CompletedWithoutResult {
                    key: self.key.clone(),
                }),
        }
    }
}

/// A request to claim `(key, user_id)` for processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdempotencyClaim {
    pub key: IdempotencyKey,
    pub user_id: UserId,
    pub endpoint: IdempotentEndpoint,
    pub request_hash: PayloadHash,
    pub now: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Result of the atomic conditional insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// This caller now owns the key (fresh insert or expired row replaced).
    Claimed,
    /// A live record already exists; read it to decide.
    AlreadyExists,
}

/// Completion written inside the reservation transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdempotencyCompletion {
    pub key: IdempotencyKey,
    pub user_id: UserId,
    pub request_hash: PayloadHash,
    pub response_body_hash: PayloadHash,
    pub reservation_id: Uuid,
    pub completed_at: DateTime<Utc>,
}
