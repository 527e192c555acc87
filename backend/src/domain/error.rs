//! Domain-level error types.
//!
//! These errors are transport agnostic. Inbound adapters map them to HTTP
//! responses or any other protocol-specific envelope by branching on
//! [`ErrorKind`] rather than matching individual codes.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::idempotency::{IdempotencyKeyValidationError, IdempotencyProtocolError};
use super::reservation::ReservationValidationError;
use super::user::UserValidationError;

/// Broad failure category used by callers to branch programmatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The client sent something that can be fixed and retried.
    Validation,
    /// A referenced entity does not exist.
    NotFound,
    /// The request collides with existing state.
    Conflict,
    /// A dependency such as the database failed.
    Infrastructure,
    /// An invariant inside the service was violated.
    Internal,
}

/// Stable machine-readable error code describing the failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidTimeSlot,
    LeadTimeNotMet,
    NegativePrice,
    PriceOutOfRange,
    InvalidCoupon,
    NoteTooLong,
    ReservationCanceled,
    /// The request is malformed or fails validation outside the aggregate.
    InvalidRequest,
    ResourceNotFound,
    CouponNotFound,
    ReservationNotFound,
    IdempotencyKeyNotFound,
    /// The requested slot overlaps a confirmed reservation.
    ReservationConflict,
    /// An idempotency key was reused for a different request.
    DuplicateReservation,
    /// A uniqueness or foreign-key constraint rejected a write.
    StorageConstraintViolation,
    DatabaseOperationFailed,
    InternalError,
}

impl ErrorCode {
    /// Category this code belongs to.
    ///
    /// # Examples
    /// ```
    /// use reservations::domain::{ErrorCode, ErrorKind};
    ///
    /// assert_eq!(ErrorCode::ReservationConflict.kind(), ErrorKind::Conflict);
    /// assert_eq!(ErrorCode::LeadTimeNotMet.kind(), ErrorKind::Validation);
    /// ```
    pub fn kind(self) -> ErrorKind {
        match self {
            Self::InvalidTimeSlot
            | Self::LeadTimeNotMet
            | Self::NegativePrice
            | Self::PriceOutOfRange
            | Self::InvalidCoupon
            | Self::NoteTooLong
            | Self::ReservationCanceled
            | Self::InvalidRequest => ErrorKind::Validation,
            Self::ResourceNotFound
            | Self::CouponNotFound
            | Self::ReservationNotFound
            | Self::IdempotencyKeyNotFound => ErrorKind::NotFound,
            Self::ReservationConflict
            | Self::DuplicateReservation
            | Self::StorageConstraintViolation => ErrorKind::Conflict,
            Self::DatabaseOperationFailed => ErrorKind::Infrastructure,
            Self::InternalError => ErrorKind::Internal,
        }
    }
}

/// Orchestration step during which an error was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    IdempotencyCheck,
    DomainConstruction,
    DatabaseOperation,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::IdempotencyCheck => "idempotency check",
            Self::DomainConstruction => "domain construction",
            Self::DatabaseOperation => "database operation",
        };
        f.write_str(label)
    }
}

type Source = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Domain error returned by reservation services.
///
/// The message is safe to show to clients; infrastructure failures carry an
/// opaque message and keep the driver error in [`std::error::Error::source`].
///
/// # Examples
/// ```
/// use reservations::domain::{Error, ErrorKind, Phase};
///
/// let err = Error::database_operation_failed().with_phase(Phase::DatabaseOperation);
/// assert!(err.is_kind(ErrorKind::Infrastructure));
/// assert_eq!(err.phase(), Some(Phase::DatabaseOperation));
/// ```
#[derive(Debug, Clone)]
pub struct Error {
    code: ErrorCode,
    message: String,
    phase: Option<Phase>,
    source: Option<Source>,
}

impl Error {
    /// Create an error with the given code and client-facing message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            phase: None,
            source: None,
        }
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Category of [`Self::code`].
    pub fn kind(&self) -> ErrorKind {
        self.code.kind()
    }

    /// Whether this error belongs to `kind`.
    pub fn is_kind(&self, kind: ErrorKind) -> bool {
        self.kind() == kind
    }

    /// Human-readable message returned to adapters.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Orchestration phase that produced the error, if recorded.
    pub fn phase(&self) -> Option<Phase> {
        self.phase
    }

    /// Record the phase in which the error occurred. An existing phase is
    /// kept so the innermost step wins.
    #[must_use]
    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase.get_or_insert(phase);
        self
    }

    /// Attach the underlying cause.
    #[must_use]
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Arc::new(source));
        self
    }

    /// Convenience constructor for [`ErrorCode::InvalidRequest`].
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    pub fn resource_not_found(id: Uuid) -> Self {
        Self::new(ErrorCode::ResourceNotFound, format!("resource {id} not found"))
    }

    pub fn coupon_not_found(code: &str) -> Self {
        Self::new(ErrorCode::CouponNotFound, format!("coupon {code} not found"))
    }

    pub fn reservation_not_found(id: Uuid) -> Self {
        Self::new(
            ErrorCode::ReservationNotFound,
            format!("reservation {id} not found"),
        )
    }

    /// The slot overlaps a confirmed reservation on the same resource.
    pub fn reservation_conflict() -> Self {
        Self::new(
            ErrorCode::ReservationConflict,
            "the requested slot overlaps an existing reservation",
        )
    }

    /// The idempotency key is bound to a different request.
    pub fn duplicate_reservation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DuplicateReservation, message)
    }

    pub fn storage_constraint_violation() -> Self {
        Self::new(
            ErrorCode::StorageConstraintViolation,
            "the write was rejected by a storage constraint",
        )
    }

    /// Opaque infrastructure failure; attach the cause with
    /// [`Self::with_source`].
    pub fn database_operation_failed() -> Self {
        Self::new(
            ErrorCode::DatabaseOperationFailed,
            "a database operation failed",
        )
    }

    /// Convenience constructor for [`ErrorCode::InternalError`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.phase {
            Some(phase) => write!(f, "{} (during {phase})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|err| err as &(dyn std::error::Error + 'static))
    }
}

impl From<ReservationValidationError> for Error {
    fn from(value: ReservationValidationError) -> Self {
        let code = match &value {
            ReservationValidationError::InvalidTimeSlot { .. } => ErrorCode::InvalidTimeSlot,
            ReservationValidationError::LeadTimeNotMet { .. } => ErrorCode::LeadTimeNotMet,
            ReservationValidationError::NegativePrice { .. } => ErrorCode::NegativePrice,
            ReservationValidationError::PriceOutOfRange { .. } => ErrorCode::PriceOutOfRange,
            ReservationValidationError::InvalidCoupon { .. } => ErrorCode::InvalidCoupon,
            ReservationValidationError::NoteTooLong { .. } => ErrorCode::NoteTooLong,
            ReservationValidationError::ReservationCanceled { .. } => {
                ErrorCode::ReservationCanceled
            }
        };
        Self::new(code, value.to_string()).with_source(value)
    }
}

impl From<UserValidationError> for Error {
    fn from(value: UserValidationError) -> Self {
        Self::invalid_request(value.to_string()).with_source(value)
    }
}

impl From<IdempotencyKeyValidationError> for Error {
    fn from(value: IdempotencyKeyValidationError) -> Self {
        Self::invalid_request(value.to_string()).with_source(value)
    }
}

impl From<IdempotencyProtocolError> for Error {
    fn from(value: IdempotencyProtocolError) -> Self {
        let err = match &value {
            IdempotencyProtocolError::PayloadMismatch { .. } => {
                Self::duplicate_reservation(value.to_string())
            }
            IdempotencyProtocolError::CompletedWithoutResult { .. } => {
                Self::internal(value.to_string())
            }
        };
        err.with_phase(Phase::IdempotencyCheck).with_source(value)
    }
}
