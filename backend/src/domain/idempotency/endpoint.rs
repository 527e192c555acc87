//! Endpoint discriminators for idempotent operations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The operation an idempotency record protects.
///
/// Stored alongside the record so that audit queries can tell which endpoint
/// claimed a key.
///
/// # Example
///
/// ```
/// # use reservations::domain::idempotency::IdempotentEndpoint;
/// let endpoint = IdempotentEndpoint::CreateReservation;
/// assert_eq!(endpoint.as_str(), "reservations.create");
/// assert_eq!("reservations.create".parse::<IdempotentEndpoint>(), Ok(endpoint));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdempotentEndpoint {
    /// Reservation creation (`POST /reservations`).
    CreateReservation,
}

impl IdempotentEndpoint {
    /// All endpoint variants.
    pub const ALL: [Self; 1] = [Self::CreateReservation];

    /// Returns the database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateReservation => "reservations.create",
        }
    }
}

impl fmt::Display for IdempotentEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown endpoint string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid idempotent endpoint '{input}'")]
pub struct ParseIdempotentEndpointError {
    /// The invalid input string.
    pub input: String,
}

impl FromStr for IdempotentEndpoint {
    type Err = ParseIdempotentEndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|v| v.as_str() == s)
            .copied()
            .ok_or_else(|| ParseIdempotentEndpointError {
                input: s.to_owned(),
            })
    }
}
