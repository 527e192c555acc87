//! Shared Diesel error mapping for the read-mostly adapters.
//!
//! Each port has its own error enum with `Connection` and `Query` variants;
//! these helpers take the port's constructors so the classification lives in
//! one place.

use tracing::debug;

use super::pool::PoolError;

/// Map pool errors into a repository-specific connection error constructor.
pub fn map_basic_pool_error<E, C>(error: PoolError, connection: C) -> E
where
    C: FnOnce(String) -> E,
{
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    connection(message)
}

/// Map common Diesel error variants into query/connection constructors.
///
/// Driver detail is logged at debug level and never copied into the
/// returned error.
pub fn map_basic_diesel_error<E, Q, C>(error: diesel::result::Error, query: Q, connection: C) -> E
where
    Q: Fn(&'static str) -> E,
    C: Fn(&'static str) -> E,
{
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => query("record not found"),
        DieselError::QueryBuilderError(_) => query("database query error"),
        DieselError::DeserializationError(_) => query("unexpected column value"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            connection("database connection error")
        }
        _ => query("database error"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::ResourceRepositoryError;
    use rstest::rstest;

    #[rstest]
    fn pool_errors_become_connection_errors() {
        let err: ResourceRepositoryError = map_basic_pool_error(
            PoolError::checkout("timed out"),
            ResourceRepositoryError::connection,
        );
        assert_eq!(err, ResourceRepositoryError::connection("timed out"));
    }

    #[rstest]
    fn not_found_becomes_query_error() {
        let err: ResourceRepositoryError = map_basic_diesel_error(
            diesel::result::Error::NotFound,
            ResourceRepositoryError::query,
            ResourceRepositoryError::connection,
        );
        assert_eq!(err, ResourceRepositoryError::query("record not found"));
    }
}
