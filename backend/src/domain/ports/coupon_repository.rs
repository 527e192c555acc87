//! Driven port for coupon lookups.
//!
//! Coupons are managed elsewhere; the reservation flow only reads them.

use async_trait::async_trait;

use crate::domain::reservation::Coupon;

use super::define_port_error;

define_port_error! {
    /// Errors raised by coupon repository adapters.
    pub enum CouponRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "coupon repository connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } => "coupon repository query failed: {message}",
        /// A stored row could not be mapped to a coupon.
        Decode { message: String } => "coupon repository returned an invalid row: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CouponRepository: Send + Sync {
    /// Fetch a coupon by its exact code.
    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, CouponRepositoryError>;
}

/// Fixture implementation that knows no coupons.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureCouponRepository;

#[async_trait]
impl CouponRepository for FixtureCouponRepository {
    async fn find_by_code(&self, _code: &str) -> Result<Option<Coupon>, CouponRepositoryError> {
        Ok(None)
    }
}
