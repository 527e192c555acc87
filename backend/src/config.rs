//! Service configuration loaded via OrthoConfig.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::IdempotencyConfig;
use crate::outbound::persistence::PoolConfig;

const DEFAULT_POOL_MAX_SIZE: u32 = 10;
const DEFAULT_IN_FLIGHT_ATTEMPTS: u32 = 5;
const DEFAULT_IN_FLIGHT_INTERVAL_MS: u64 = 100;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 3600;

/// Settings for the reservation service and its maintenance binary.
///
/// Every field can be set through `RESERVATIONS_*` environment variables,
/// a configuration file, or command-line flags.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "RESERVATIONS")]
pub struct ReservationSettings {
    /// PostgreSQL connection string.
    pub database_url: Option<String>,
    /// Maximum pooled connections.
    pub pool_max_size: Option<u32>,
    /// How long idempotency records are kept, in hours.
    #[ortho_config(default = 24)]
    pub idempotency_ttl_hours: u64,
    /// Re-reads of an in-flight record before reporting it as in progress.
    pub in_flight_attempts: Option<u32>,
    /// Delay between in-flight re-reads, in milliseconds.
    pub in_flight_interval_ms: Option<u64>,
    /// Period of the expired-record sweep, in seconds.
    pub sweep_interval_secs: Option<u64>,
}

impl ReservationSettings {
    /// Domain idempotency settings. The TTL is clamped to 1..=87600 hours.
    pub fn idempotency_config(&self) -> IdempotencyConfig {
        IdempotencyConfig::from_hours(self.idempotency_ttl_hours).with_in_flight_wait(
            self.in_flight_attempts
                .unwrap_or(DEFAULT_IN_FLIGHT_ATTEMPTS),
            Duration::from_millis(
                self.in_flight_interval_ms
                    .unwrap_or(DEFAULT_IN_FLIGHT_INTERVAL_MS),
            ),
        )
    }

    /// Pool configuration, or `None` when no database URL is configured.
    pub fn pool_config(&self) -> Option<PoolConfig> {
        let url = self.database_url.as_deref()?;
        Some(
            PoolConfig::new(url)
                .with_max_size(self.pool_max_size.unwrap_or(DEFAULT_POOL_MAX_SIZE)),
        )
    }

    /// Period of the expired idempotency record sweep.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(
            self.sweep_interval_secs
                .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS)
                .max(1),
        )
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 6] = [
        "RESERVATIONS_DATABASE_URL",
        "RESERVATIONS_POOL_MAX_SIZE",
        "RESERVATIONS_IDEMPOTENCY_TTL_HOURS",
        "RESERVATIONS_IN_FLIGHT_ATTEMPTS",
        "RESERVATIONS_IN_FLIGHT_INTERVAL_MS",
        "RESERVATIONS_SWEEP_INTERVAL_SECS",
    ];

    fn load_from_empty_args() -> ReservationSettings {
        ReservationSettings::load_from_iter([OsString::from("reservations")])
            .expect("config should load")
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();
        assert!(settings.pool_config().is_none());
        assert_eq!(
            settings.idempotency_ttl_hours,
            IdempotencyConfig::DEFAULT_TTL_HOURS
        );

        let idempotency = settings.idempotency_config();
        assert_eq!(idempotency.ttl(), Duration::from_secs(24 * 3600));
        assert_eq!(idempotency.in_flight_attempts(), DEFAULT_IN_FLIGHT_ATTEMPTS);
        assert_eq!(
            settings.sweep_interval(),
            Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS)
        );
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            (
                "RESERVATIONS_DATABASE_URL",
                Some("postgres://db/reservations".to_owned()),
            ),
            ("RESERVATIONS_POOL_MAX_SIZE", Some("3".to_owned())),
            ("RESERVATIONS_IDEMPOTENCY_TTL_HOURS", Some("48".to_owned())),
            ("RESERVATIONS_IN_FLIGHT_ATTEMPTS", Some("2".to_owned())),
            ("RESERVATIONS_IN_FLIGHT_INTERVAL_MS", Some("50".to_owned())),
            ("RESERVATIONS_SWEEP_INTERVAL_SECS", Some("60".to_owned())),
        ]);

        let settings = load_from_empty_args();
        let pool = settings.pool_config().expect("database url is set");
        assert_eq!(pool.database_url(), "postgres://db/reservations");
        assert_eq!(pool.max_size(), 3);

        let idempotency = settings.idempotency_config();
        assert_eq!(idempotency.ttl(), Duration::from_secs(48 * 3600));
        assert_eq!(idempotency.in_flight_attempts(), 2);
        assert_eq!(idempotency.in_flight_interval(), Duration::from_millis(50));
        assert_eq!(settings.sweep_interval(), Duration::from_secs(60));
    }

    #[rstest]
    fn zero_ttl_is_clamped_to_one_hour() {
        let _guard = lock_env([
            ("RESERVATIONS_DATABASE_URL", None::<String>),
            ("RESERVATIONS_IDEMPOTENCY_TTL_HOURS", Some("0".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(
            settings.idempotency_config().ttl(),
            Duration::from_secs(3600)
        );
    }
}
