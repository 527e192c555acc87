//! PostgreSQL-backed `CouponRepository` implementation.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{CouponRepository, CouponRepositoryError};
use crate::domain::reservation::Coupon;

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::CouponRow;
use super::pool::{DbPool, PoolError};
use super::schema::coupons;

/// Diesel-backed implementation of the coupon port.
#[derive(Clone)]
pub struct DieselCouponRepository {
    pool: DbPool,
}

impl DieselCouponRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> CouponRepositoryError {
    map_basic_pool_error(error, CouponRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> CouponRepositoryError {
    map_basic_diesel_error(
        error,
        CouponRepositoryError::query,
        CouponRepositoryError::connection,
    )
}

#[async_trait]
impl CouponRepository for DieselCouponRepository {
    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, CouponRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<CouponRow> = coupons::table
            .filter(coupons::code.eq(code))
            .select(CouponRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(Coupon::try_from)
            .transpose()
            .map_err(CouponRepositoryError::decode)
    }
}
