//! Port abstraction for the idempotency ledger.
//!
//! Records are keyed by `(key, user_id)`. Claiming is a single atomic
//! conditional insert so that two concurrent requests can never both own a
//! key; completion happens inside the reservation transaction and is
//! therefore part of [`super::ReservationUnitOfWork`], not this port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::UserId;
use crate::domain::idempotency::{ClaimOutcome, IdempotencyClaim, IdempotencyKey, IdempotencyRecord};

use super::define_port_error;

define_port_error! {
    /// Errors raised by idempotency repository adapters.
    pub enum IdempotencyRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "idempotency repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "idempotency repository query failed: {message}",
        /// A stored row could not be mapped to a record.
        Decode { message: String } => "idempotency repository returned an invalid row: {message}",
    }
}

/// Port for idempotency record storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdempotencyRepository: Send + Sync {
    /// Atomically claim `(key, user_id)` in `processing` state.
    ///
    /// A live record makes this a no-op returning
    /// [`ClaimOutcome::AlreadyExists`]. An expired record is overwritten in
    /// the same statement and counts as [`ClaimOutcome::Claimed`].
    async fn try_insert(
        &self,
        claim: &IdempotencyClaim,
    ) -> Result<ClaimOutcome, IdempotencyRepositoryError>;

    /// Read the live record for `(key, user_id)`.
    ///
    /// Records whose `expires_at` is at or before `now` read as `None`.
    async fn get(
        &self,
        key: &IdempotencyKey,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<IdempotencyRecord>, IdempotencyRepositoryError>;

    /// Drop the `processing` row written by `claim` so the client may retry
    /// with the same key.
    ///
    /// Only a row whose `request_hash` and `created_at` still match the claim
    /// is deleted. Completed records, and rows re-claimed by a later request
    /// after this claim expired, are left untouched.
    async fn release(&self, claim: &IdempotencyClaim) -> Result<(), IdempotencyRepositoryError>;

    /// Delete every record that expired at or before `now`.
    ///
    /// Returns the number of records deleted.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, IdempotencyRepositoryError>;
}

/// Fixture implementation for testing without a real database.
///
/// Every claim succeeds and nothing is stored. Use it in unit tests where
/// idempotency behaviour is not under test.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureIdempotencyRepository;

#[async_trait]
impl IdempotencyRepository for FixtureIdempotencyRepository {
    async fn try_insert(
        &self,
        _claim: &IdempotencyClaim,
    ) -> Result<ClaimOutcome, IdempotencyRepositoryError> {
        Ok(ClaimOutcome::Claimed)
    }

    async fn get(
        &self,
        _key: &IdempotencyKey,
        _user_id: &UserId,
        _now: DateTime<Utc>,
    ) -> Result<Option<IdempotencyRecord>, IdempotencyRepositoryError> {
        Ok(None)
    }

    async fn release(&self, _claim: &IdempotencyClaim) -> Result<(), IdempotencyRepositoryError> {
        Ok(())
    }

    async fn purge_expired(&self, _now: DateTime<Utc>) -> Result<u64, IdempotencyRepositoryError> {
        Ok(0)
    }
}
