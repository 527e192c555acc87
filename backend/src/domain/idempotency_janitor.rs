//! Periodic removal of expired idempotency records.
//!
//! Expired rows already read as absent, so purging is housekeeping only: it
//! keeps the ledger table from growing without bound.

use std::sync::Arc;

use mockable::Clock;
use tracing::info;

use crate::domain::Error;
use crate::domain::ports::IdempotencyRepository;
use crate::domain::reservation_service_support::map_idempotency_error;

/// Deletes idempotency records whose TTL has elapsed.
#[derive(Clone)]
pub struct IdempotencyJanitor<I> {
    idempotency: Arc<I>,
    clock: Arc<dyn Clock>,
}

impl<I> IdempotencyJanitor<I> {
    pub fn new(idempotency: Arc<I>, clock: Arc<dyn Clock>) -> Self {
        Self { idempotency, clock }
    }
}

impl<I> IdempotencyJanitor<I>
where
    I: IdempotencyRepository,
{
    /// Purge every record expired as of now and return how many were
    /// removed.
    ///
    /// # Errors
    ///
    /// `DatabaseOperationFailed` when the delete fails.
    pub async fn purge(&self) -> Result<u64, Error> {
        let now = self.clock.utc();
        let purged = self
            .idempotency
            .purge_expired(now)
            .await
            .map_err(map_idempotency_error)?;
        if purged > 0 {
            info!(purged, cutoff = %now, "purged expired idempotency records");
        }
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{IdempotencyRepositoryError, MockIdempotencyRepository};
    use chrono::{DateTime, Local, TimeZone, Utc};
    use rstest::rstest;

    struct FixtureClock(DateTime<Utc>);

    impl Clock for FixtureClock {
        fn local(&self) -> DateTime<Local> {
            self.0.with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn cutoff() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    #[rstest]
    #[tokio::test]
    async fn purge_uses_clock_as_cutoff() {
        let mut repo = MockIdempotencyRepository::new();
        repo.expect_purge_expired()
            .withf(|now| *now == cutoff())
            .times(1)
            .returning(|_| Ok(3));

        let janitor = IdempotencyJanitor::new(Arc::new(repo), Arc::new(FixtureClock(cutoff())));
        assert_eq!(janitor.purge().await.expect("purge succeeds"), 3);
    }

    #[rstest]
    #[tokio::test]
    async fn purge_failure_is_infrastructure_error() {
        let mut repo = MockIdempotencyRepository::new();
        repo.expect_purge_expired()
            .returning(|_| Err(IdempotencyRepositoryError::query("deadlock detected")));

        let janitor = IdempotencyJanitor::new(Arc::new(repo), Arc::new(FixtureClock(cutoff())));
        let err = janitor.purge().await.expect_err("purge fails");
        assert_eq!(err.code(), ErrorCode::DatabaseOperationFailed);
    }
}
