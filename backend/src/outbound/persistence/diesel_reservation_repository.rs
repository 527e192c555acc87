//! PostgreSQL-backed reservation read models.
//!
//! The `slot` column is a `tstzrange`; its bounds are projected with
//! `lower()`/`upper()` so rows load through `QueryableByName` without a range
//! type on the Rust side.

use async_trait::async_trait;
use diesel::sql_query;
use diesel::sql_types::Uuid as SqlUuid;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::UserId;
use crate::domain::ports::{ReservationRepository, ReservationRepositoryError};
use crate::domain::reservation::{ReservationListItem, ReservationView};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{ReservationListRow, ReservationViewRow};
use super::pool::{DbPool, PoolError};

const FIND_VIEW_SQL: &str = r#"
SELECT
    r.id,
    r.resource_id,
    res.name AS resource_name,
    r.user_id,
    lower(r.slot) AS start_at,
    upper(r.slot) AS end_at,
    r.status,
    r.price_cents,
    r.coupon_id,
    c.code AS coupon_code,
    r.note,
    r.created_at,
    r.updated_at
FROM reservations r
JOIN resources res ON res.id = r.resource_id
LEFT JOIN coupons c ON c.id = r.coupon_id
WHERE r.id = $1
"#;

const LIST_FOR_USER_SQL: &str = r#"
SELECT
    r.id,
    r.resource_id,
    res.name AS resource_name,
    lower(r.slot) AS start_at,
    upper(r.slot) AS end_at,
    r.status,
    r.price_cents
FROM reservations r
JOIN resources res ON res.id = r.resource_id
WHERE r.user_id = $1
ORDER BY lower(r.slot) DESC, r.id
"#;

/// Diesel-backed implementation of the reservation read port.
#[derive(Clone)]
pub struct DieselReservationRepository {
    pool: DbPool,
}

impl DieselReservationRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ReservationRepositoryError {
    map_basic_pool_error(error, ReservationRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> ReservationRepositoryError {
    map_basic_diesel_error(
        error,
        ReservationRepositoryError::query,
        ReservationRepositoryError::connection,
    )
}

#[async_trait]
impl ReservationRepository for DieselReservationRepository {
    async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<ReservationView>, ReservationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<ReservationViewRow> = sql_query(FIND_VIEW_SQL)
            .bind::<SqlUuid, _>(id)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter()
            .next()
            .map(ReservationView::try_from)
            .transpose()
            .map_err(ReservationRepositoryError::decode)
    }

    async fn find_by_user_id(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ReservationListItem>, ReservationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<ReservationListRow> = sql_query(LIST_FOR_USER_SQL)
            .bind::<SqlUuid, _>(*user_id.as_uuid())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter()
            .map(ReservationListItem::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(ReservationRepositoryError::decode)
    }
}
