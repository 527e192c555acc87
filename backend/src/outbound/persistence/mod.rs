//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the reservation ports backed by PostgreSQL via
//! `diesel-async` and `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: repositories translate between Diesel rows and domain
//!   types. Pricing, lead-time and idempotency decisions stay in the domain.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Database-enforced invariants**: overlapping confirmed reservations are
//!   rejected by the `reservations_no_overlap` exclusion constraint and the
//!   idempotency claim is a single conditional upsert.
//!
//! # Example
//!
//! ```ignore
//! use reservations::outbound::persistence::{DbPool, DieselResourceRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/reservations")).await?;
//! let resources = DieselResourceRepository::new(pool);
//! ```

mod diesel_basic_error_mapping;
mod diesel_coupon_repository;
pub(crate) mod diesel_helpers;
mod diesel_idempotency_repository;
mod diesel_reservation_repository;
mod diesel_reservation_unit_of_work;
mod diesel_resource_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_coupon_repository::DieselCouponRepository;
pub use diesel_idempotency_repository::DieselIdempotencyRepository;
pub use diesel_reservation_repository::DieselReservationRepository;
pub use diesel_reservation_unit_of_work::DieselReservationUnitOfWork;
pub use diesel_resource_repository::DieselResourceRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError, PoolStatus};
