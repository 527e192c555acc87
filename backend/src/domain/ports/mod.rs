//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod coupon_repository;
mod idempotency_repository;
mod reservation_repository;
mod reservation_unit_of_work;
mod resource_repository;

#[cfg(test)]
pub use coupon_repository::MockCouponRepository;
pub use coupon_repository::{CouponRepository, CouponRepositoryError, FixtureCouponRepository};
#[cfg(test)]
pub use idempotency_repository::MockIdempotencyRepository;
pub use idempotency_repository::{
    FixtureIdempotencyRepository, IdempotencyRepository, IdempotencyRepositoryError,
};
#[cfg(test)]
pub use reservation_repository::MockReservationRepository;
pub use reservation_repository::{
    FixtureReservationRepository, ReservationRepository, ReservationRepositoryError,
};
#[cfg(test)]
pub use reservation_unit_of_work::MockReservationUnitOfWork;
pub use reservation_unit_of_work::{
    FixtureReservationUnitOfWork, ReservationCommit, ReservationUnitOfWork,
    ReservationUnitOfWorkError,
};
#[cfg(test)]
pub use resource_repository::MockResourceRepository;
pub use resource_repository::{
    FixtureResourceRepository, ResourceRepository, ResourceRepositoryError,
};

#[cfg(test)]
mod tests;
