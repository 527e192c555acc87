//! PostgreSQL transaction for reservation creation.
//!
//! One `AsyncConnection::transaction` scope performs three writes:
//! the reservation row, its notification job, and the idempotency
//! completion. Returning an error from the scope rolls all of them back.

use async_trait::async_trait;
use diesel::sql_query;
use diesel::sql_types::{Bytea, Integer, Nullable, Text, Timestamptz, Uuid as SqlUuid};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::idempotency::{IdempotencyCompletion, IdempotencyStatus};
use crate::domain::notification::NotificationJob;
use crate::domain::ports::{ReservationCommit, ReservationUnitOfWork, ReservationUnitOfWorkError};
use crate::domain::reservation::Reservation;

use super::diesel_helpers::{map_pool_error_message, map_write_error};
use super::models::NewNotificationJobRow;
use super::pool::DbPool;
use super::schema::notification_jobs;

const INSERT_RESERVATION_SQL: &str = r#"
INSERT INTO reservations
    (id, resource_id, user_id, slot, status, price_cents, coupon_id, note, created_at, updated_at)
VALUES ($1, $2, $3, $4::tstzrange, $5, $6, $7, $8, $9, $10)
"#;

const COMPLETE_IDEMPOTENCY_SQL: &str = r#"
UPDATE idempotency_records
SET status = $3,
    response_body_hash = $4,
    result_reservation_id = $5,
    updated_at = $6
WHERE key = $1
  AND user_id = $2
  AND status = $7
  AND request_hash = $8
"#;

/// Failure inside the transaction scope.
enum TransactionError {
    Diesel(diesel::result::Error),
    ClaimLost,
}

impl From<diesel::result::Error> for TransactionError {
    fn from(value: diesel::result::Error) -> Self {
        Self::Diesel(value)
    }
}

/// Diesel-backed implementation of the reservation unit of work.
#[derive(Clone)]
pub struct DieselReservationUnitOfWork {
    pool: DbPool,
}

impl DieselReservationUnitOfWork {
    /// Create a new unit of work with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

async fn insert_reservation(
    conn: &mut AsyncPgConnection,
    reservation: &Reservation,
) -> diesel::QueryResult<()> {
    sql_query(INSERT_RESERVATION_SQL)
        .bind::<SqlUuid, _>(reservation.id())
        .bind::<SqlUuid, _>(reservation.resource_id())
        .bind::<SqlUuid, _>(*reservation.user_id().as_uuid())
        .bind::<Text, _>(reservation.time_slot().to_range_literal())
        .bind::<Text, _>(reservation.status().as_str())
        .bind::<Integer, _>(reservation.price().cents())
        .bind::<Nullable<SqlUuid>, _>(reservation.coupon_id())
        .bind::<Text, _>(reservation.note().as_str())
        .bind::<Timestamptz, _>(reservation.created_at())
        .bind::<Timestamptz, _>(reservation.updated_at())
        .execute(conn)
        .await?;
    Ok(())
}

async fn insert_notification_job(
    conn: &mut AsyncPgConnection,
    job: &NotificationJob,
) -> diesel::QueryResult<()> {
    let row = NewNotificationJobRow {
        id: job.id,
        kind: job.kind.as_str(),
        payload: &job.payload,
        run_at: job.run_at,
    };
    diesel::insert_into(notification_jobs::table)
        .values(&row)
        .execute(conn)
        .await?;
    Ok(())
}

/// Returns the number of ledger rows moved to `completed`.
async fn complete_idempotency(
    conn: &mut AsyncPgConnection,
    completion: &IdempotencyCompletion,
) -> diesel::QueryResult<usize> {
    sql_query(COMPLETE_IDEMPOTENCY_SQL)
        .bind::<Text, _>(completion.key.as_str())
        .bind::<SqlUuid, _>(*completion.user_id.as_uuid())
        .bind::<Text, _>(IdempotencyStatus::Completed.as_str())
        .bind::<Bytea, _>(completion.response_body_hash.as_bytes().to_vec())
        .bind::<SqlUuid, _>(completion.reservation_id)
        .bind::<Timestamptz, _>(completion.completed_at)
        .bind::<Text, _>(IdempotencyStatus::Processing.as_str())
        .bind::<Bytea, _>(completion.request_hash.as_bytes().to_vec())
        .execute(conn)
        .await
}

#[async_trait]
impl ReservationUnitOfWork for DieselReservationUnitOfWork {
    async fn commit(&self, commit: &ReservationCommit) -> Result<(), ReservationUnitOfWorkError> {
        use diesel_async::AsyncConnection as _;
        use diesel_async::scoped_futures::ScopedFutureExt as _;

        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| ReservationUnitOfWorkError::connection(map_pool_error_message(err)))?;

        let result = conn
            .transaction::<_, TransactionError, _>(|conn| {
                async move {
                    insert_reservation(conn, &commit.reservation).await?;
                    insert_notification_job(conn, &commit.notification).await?;
                    if complete_idempotency(conn, &commit.completion).await? == 0 {
                        return Err(TransactionError::ClaimLost);
                    }
                    Ok(())
                }
                .scope_boxed()
            })
            .await;

        match result {
            Ok(()) => {
                debug!(reservation_id = %commit.reservation.id(), "reservation transaction committed");
                Ok(())
            }
            Err(TransactionError::ClaimLost) => Err(ReservationUnitOfWorkError::claim_lost(
                commit.completion.key.as_str(),
            )),
            Err(TransactionError::Diesel(error)) => Err(map_write_error(error)),
        }
    }
}
