//! Configuration for idempotency behaviour.

use std::time::Duration;

/// Idempotency TTL and in-flight wait policy.
///
/// # Example
///
/// ```
/// # use reservations::domain::idempotency::IdempotencyConfig;
/// # use std::time::Duration;
/// let config = IdempotencyConfig::default();
/// assert_eq!(config.ttl(), Duration::from_secs(24 * 3600));
///
/// let custom = IdempotencyConfig::from_hours(0);
/// assert_eq!(custom.ttl(), Duration::from_secs(3600));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdempotencyConfig {
    ttl: Duration,
    in_flight_attempts: u32,
    in_flight_interval: Duration,
}

impl IdempotencyConfig {
    /// Default TTL in hours.
    pub const DEFAULT_TTL_HOURS: u64 = 24;

    /// Minimum allowed TTL in hours.
    ///
    /// Prevents TTLs so short that records expire before retries complete.
    const MIN_TTL_HOURS: u64 = 1;

    /// Maximum allowed TTL in hours (10 years).
    const MAX_TTL_HOURS: u64 = 24 * 365 * 10;

    const DEFAULT_IN_FLIGHT_ATTEMPTS: u32 = 5;
    const DEFAULT_IN_FLIGHT_INTERVAL: Duration = Duration::from_millis(100);

    /// Build from a TTL in hours, clamped to `[1, 87600]`.
    pub fn from_hours(hours: u64) -> Self {
        let hours = hours.clamp(Self::MIN_TTL_HOURS, Self::MAX_TTL_HOURS);
        Self::with_ttl(Duration::from_secs(hours.saturating_mul(3600)))
    }

    /// Create with explicit TTL (for testing).
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            in_flight_attempts: Self::DEFAULT_IN_FLIGHT_ATTEMPTS,
            in_flight_interval: Self::DEFAULT_IN_FLIGHT_INTERVAL,
        }
    }

    /// How long to wait for a concurrent attempt with the same key to finish
    /// before reporting it as still in progress. Zero attempts disables the
    /// wait.
    #[must_use]
    pub fn with_in_flight_wait(mut self, attempts: u32, interval: Duration) -> Self {
        self.in_flight_attempts = attempts;
        self.in_flight_interval = interval;
        self
    }

    /// Returns the configured TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of re-reads while another request holds the key.
    pub fn in_flight_attempts(&self) -> u32 {
        self.in_flight_attempts
    }

    /// Delay between re-reads.
    pub fn in_flight_interval(&self) -> Duration {
        self.in_flight_interval
    }
}

impl Default for IdempotencyConfig {
    fn default() -> Self {
        Self::from_hours(Self::DEFAULT_TTL_HOURS)
    }
}
