//! PostgreSQL-backed `ResourceRepository` implementation.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{ResourceRepository, ResourceRepositoryError};
use crate::domain::reservation::Resource;

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::ResourceRow;
use super::pool::{DbPool, PoolError};
use super::schema::resources;

/// Diesel-backed implementation of the resource port.
#[derive(Clone)]
pub struct DieselResourceRepository {
    pool: DbPool,
}

impl DieselResourceRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ResourceRepositoryError {
    map_basic_pool_error(error, ResourceRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> ResourceRepositoryError {
    map_basic_diesel_error(
        error,
        ResourceRepositoryError::query,
        ResourceRepositoryError::connection,
    )
}

#[async_trait]
impl ResourceRepository for DieselResourceRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Resource>, ResourceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<ResourceRow> = resources::table
            .filter(resources::id.eq(id))
            .select(ResourceRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(Resource::from))
    }
}
