//! Reservation booking backend.
//!
//! Idempotent, conflict-free reservation creation over PostgreSQL. The
//! `domain` module owns the rules and orchestration; `outbound` holds the
//! Diesel adapters that implement its ports.

pub mod config;
pub mod domain;
pub mod outbound;
#[cfg(feature = "test-support")]
pub mod test_support;
