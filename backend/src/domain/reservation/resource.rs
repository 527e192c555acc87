//! Bookable resources.

use uuid::Uuid;

/// A bookable resource and its booking policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub id: Uuid,
    pub name: String,
    /// Minimum advance notice in minutes. Negative values mean "none".
    pub lead_time_minutes: i32,
    pub hourly_rate_cents: i32,
}

impl Resource {
    /// Lead time with negative configuration clamped to zero.
    pub fn effective_lead_time_minutes(&self) -> i64 {
        i64::from(self.lead_time_minutes.max(0))
    }

    /// The subset of the resource that pricing strategies may depend on.
    pub fn price_context(&self) -> ResourcePriceContext {
        ResourcePriceContext {
            resource_id: self.id,
            hourly_rate_cents: self.hourly_rate_cents,
        }
    }
}

/// Pricing input derived from a [`Resource`].
///
/// Keeps price strategies decoupled from the rest of the resource record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourcePriceContext {
    pub resource_id: Uuid,
    pub hourly_rate_cents: i32,
}
