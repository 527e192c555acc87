//! Embedded schema migrations.

use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

/// Migrations compiled in from `backend/migrations`.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Failure while applying migrations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MigrationError {
    /// Could not open a synchronous connection.
    #[error("failed to connect for migrations: {message}")]
    Connect { message: String },
    /// A migration failed to apply.
    #[error("failed to apply migrations: {message}")]
    Apply { message: String },
}

/// Apply every pending migration and return the applied versions.
///
/// This performs blocking I/O; async callers should wrap it in
/// `tokio::task::spawn_blocking`.
pub fn run_pending_migrations(database_url: &str) -> Result<Vec<String>, MigrationError> {
    let mut connection =
        PgConnection::establish(database_url).map_err(|err| MigrationError::Connect {
            message: err.to_string(),
        })?;
    let applied = connection
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| MigrationError::Apply {
            message: err.to_string(),
        })?
        .into_iter()
        .map(|version| version.to_string())
        .collect::<Vec<_>>();
    info!(count = applied.len(), "applied pending migrations");
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::migration::MigrationSource;
    use diesel::pg::Pg;
    use rstest::rstest;

    #[rstest]
    fn embedded_migrations_are_discoverable() {
        let migrations = MigrationSource::<Pg>::migrations(&MIGRATIONS)
            .unwrap_or_else(|err| panic!("list migrations: {err}"));
        assert!(!migrations.is_empty());
    }

    #[rstest]
    fn connect_error_mentions_cause() {
        let err = MigrationError::Connect {
            message: "refused".to_owned(),
        };
        assert_eq!(err.to_string(), "failed to connect for migrations: refused");
    }
}
