//! Idempotency key validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum accepted key length in characters.
pub const IDEMPOTENCY_KEY_MAX_LEN: usize = 255;

/// Validation errors for [`IdempotencyKey`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdempotencyKeyValidationError {
    /// The key string was empty.
    #[error("idempotency key must not be empty")]
    EmptyKey,
    /// The key had leading or trailing whitespace.
    #[error("idempotency key must not contain surrounding whitespace")]
    SurroundingWhitespace,
    /// The key exceeded [`IDEMPOTENCY_KEY_MAX_LEN`].
    #[error("idempotency key must be at most {max} characters")]
    TooLong { max: usize },
}

/// Client-provided token that scopes request deduplication for one user.
///
/// Any opaque string is accepted as long as it is non-empty, has no
/// surrounding whitespace, and fits the storage column.
///
/// # Example
///
/// ```
/// # use reservations::domain::idempotency::IdempotencyKey;
/// let key = IdempotencyKey::new("checkout-7f3a").expect("valid key");
/// assert_eq!(key.as_ref(), "checkout-7f3a");
/// assert!(IdempotencyKey::new(" padded ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Validate and construct an [`IdempotencyKey`].
    pub fn new(key: impl AsRef<str>) -> Result<Self, IdempotencyKeyValidationError> {
        Self::from_owned(key.as_ref().to_owned())
    }

    /// Generate a new random key.
    ///
    /// Primarily useful for testing.
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    fn from_owned(key: String) -> Result<Self, IdempotencyKeyValidationError> {
        if key.is_empty() {
            return Err(IdempotencyKeyValidationError::EmptyKey);
        }
        if key.trim() != key {
            return Err(IdempotencyKeyValidationError::SurroundingWhitespace);
        }
        if key.chars().count() > IDEMPOTENCY_KEY_MAX_LEN {
            return Err(IdempotencyKeyValidationError::TooLong {
                max: IDEMPOTENCY_KEY_MAX_LEN,
            });
        }
        Ok(Self(key))
    }

    /// Borrow the key text.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for IdempotencyKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<IdempotencyKey> for String {
    fn from(value: IdempotencyKey) -> Self {
        value.0
    }
}

impl TryFrom<String> for IdempotencyKey {
    type Error = IdempotencyKeyValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}
