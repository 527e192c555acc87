//! Domain primitives, aggregates, and services.
//!
//! Purpose: hold the reservation rules and the orchestration around them
//! without depending on any storage or transport. Adapters plug in through
//! [`ports`].
//!
//! Public surface:
//! - [`CreateReservationService`]: idempotent reservation creation.
//! - [`ReservationQueryService`]: owner-scoped reservation reads.
//! - [`IdempotencyJanitor`]: expired idempotency record cleanup.
//! - [`Error`] / [`ErrorCode`] / [`ErrorKind`]: transport-agnostic failures.

pub mod create_reservation;
pub mod error;
pub mod idempotency;
pub mod idempotency_janitor;
pub mod notification;
pub mod ports;
pub mod reservation;
pub mod reservation_query;
mod reservation_service_support;
pub mod user;

pub use self::create_reservation::{
    CreateReservationCommand, CreateReservationOutcome, CreateReservationRequest,
    CreateReservationService, ReservationPorts,
};
pub use self::error::{Error, ErrorCode, ErrorKind, Phase};
pub use self::idempotency::{IdempotencyConfig, IdempotencyKey};
pub use self::idempotency_janitor::IdempotencyJanitor;
pub use self::reservation_query::ReservationQueryService;
pub use self::user::{Requester, UserId, UserValidationError};
