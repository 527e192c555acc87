//! PostgreSQL-backed `IdempotencyRepository` implementation using Diesel ORM.
//!
//! # Claiming
//!
//! [`IdempotencyRepository::try_insert`] is one `INSERT … ON CONFLICT … DO
//! UPDATE … WHERE expires_at <= now` statement. A fresh key inserts a row; an
//! expired row is overwritten in place; a live row is left untouched and the
//! statement affects zero rows. Two concurrent claims therefore can never
//! both succeed.
//!
//! # TTL Enforcement
//!
//! Reads filter on `expires_at > now`, so expired rows are invisible even
//! before [`IdempotencyRepository::purge_expired`] removes them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{Bytea, Text, Timestamptz, Uuid as SqlUuid};
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::UserId;
use crate::domain::idempotency::{
    ClaimOutcome, IdempotencyClaim, IdempotencyKey, IdempotencyRecord, IdempotencyStatus,
};
use crate::domain::ports::{IdempotencyRepository, IdempotencyRepositoryError};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::diesel_helpers::affected_rows;
use super::models::IdempotencyRecordRow;
use super::pool::{DbPool, PoolError};
use super::schema::idempotency_records;

const CLAIM_SQL: &str = r#"
INSERT INTO idempotency_records
    (key, user_id, endpoint, request_hash, status, expires_at, created_at, updated_at)
VALUES ($1, $2, $3, $4, 'processing', $5, $6, $6)
ON CONFLICT (key, user_id) DO UPDATE SET
    endpoint = EXCLUDED.endpoint,
    request_hash = EXCLUDED.request_hash,
    status = 'processing',
    response_body_hash = NULL,
    result_reservation_id = NULL,
    expires_at = EXCLUDED.expires_at,
    created_at = EXCLUDED.created_at,
    updated_at = EXCLUDED.updated_at
WHERE idempotency_records.expires_at <= EXCLUDED.created_at
"#;

/// Diesel-backed implementation of the `IdempotencyRepository` port.
#[derive(Clone)]
pub struct DieselIdempotencyRepository {
    pool: DbPool,
}

impl DieselIdempotencyRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> IdempotencyRepositoryError {
    map_basic_pool_error(error, IdempotencyRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> IdempotencyRepositoryError {
    map_basic_diesel_error(
        error,
        IdempotencyRepositoryError::query,
        IdempotencyRepositoryError::connection,
    )
}

#[async_trait]
impl IdempotencyRepository for DieselIdempotencyRepository {
    async fn try_insert(
        &self,
        claim: &IdempotencyClaim,
    ) -> Result<ClaimOutcome, IdempotencyRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let inserted = sql_query(CLAIM_SQL)
            .bind::<Text, _>(claim.key.as_str())
            .bind::<SqlUuid, _>(*claim.user_id.as_uuid())
            .bind::<Text, _>(claim.endpoint.as_str())
            .bind::<Bytea, _>(claim.request_hash.as_bytes().to_vec())
            .bind::<Timestamptz, _>(claim.expires_at)
            .bind::<Timestamptz, _>(claim.now)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let outcome = if inserted == 0 {
            ClaimOutcome::AlreadyExists
        } else {
            ClaimOutcome::Claimed
        };
        debug!(key = %claim.key, ?outcome, "idempotency claim attempted");
        Ok(outcome)
    }

    async fn get(
        &self,
        key: &IdempotencyKey,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<IdempotencyRecord>, IdempotencyRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<IdempotencyRecordRow> = idempotency_records::table
            .filter(
                idempotency_records::key
                    .eq(key.as_str())
                    .and(idempotency_records::user_id.eq(user_id.as_uuid()))
                    .and(idempotency_records::expires_at.gt(now)),
            )
            .select(IdempotencyRecordRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(IdempotencyRecord::try_from)
            .transpose()
            .map_err(IdempotencyRepositoryError::decode)
    }

    async fn release(&self, claim: &IdempotencyClaim) -> Result<(), IdempotencyRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(idempotency_records::table)
            .filter(
                idempotency_records::key
                    .eq(claim.key.as_str())
                    .and(idempotency_records::user_id.eq(claim.user_id.as_uuid()))
                    .and(idempotency_records::status.eq(IdempotencyStatus::Processing.as_str()))
                    .and(idempotency_records::request_hash.eq(claim.request_hash.as_bytes().as_slice()))
                    .and(idempotency_records::created_at.eq(claim.now)),
            )
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        if deleted == 0 {
            debug!(key = %claim.key, "claim no longer owned; nothing released");
        } else {
            debug!(key = %claim.key, deleted, "released idempotency claim");
        }
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, IdempotencyRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(idempotency_records::table)
            .filter(idempotency_records::expires_at.le(now))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        debug!(deleted, cutoff = %now, "purged expired idempotency records");
        Ok(affected_rows(deleted))
    }
}
