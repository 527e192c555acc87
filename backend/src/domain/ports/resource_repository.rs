//! Driven port for loading bookable resources.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::reservation::Resource;

use super::define_port_error;

define_port_error! {
    /// Errors raised by resource repository adapters.
    pub enum ResourceRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "resource repository connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } => "resource repository query failed: {message}",
    }
}

/// Read access to resources and their booking policy.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResourceRepository: Send + Sync {
    /// Fetch a resource by identifier.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Resource>, ResourceRepositoryError>;
}

/// Fixture implementation that knows no resources.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureResourceRepository;

#[async_trait]
impl ResourceRepository for FixtureResourceRepository {
    async fn find_by_id(&self, _id: Uuid) -> Result<Option<Resource>, ResourceRepositoryError> {
        Ok(None)
    }
}
