//! Read models returned to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::UserId;

use super::{Coupon, Reservation, ReservationStatus, Resource};

/// Resource summary embedded in reservation views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSummary {
    pub id: Uuid,
    pub name: String,
}

/// Coupon summary embedded in reservation views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponSummary {
    pub id: Uuid,
    pub code: String,
}

/// Presentation shape of a single reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationView {
    pub id: Uuid,
    pub resource: ResourceSummary,
    pub user_id: UserId,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: ReservationStatus,
    pub price_cents: i32,
    pub coupon: Option<CouponSummary>,
    pub note: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReservationView {
    /// Project a freshly built reservation together with the entities it
    /// references.
    pub fn project(reservation: &Reservation, resource: &Resource, coupon: Option<&Coupon>) -> Self {
        Self {
            id: reservation.id(),
            resource: ResourceSummary {
                id: resource.id,
                name: resource.name.clone(),
            },
            user_id: reservation.user_id().clone(),
            start_at: reservation.time_slot().start(),
            end_at: reservation.time_slot().end(),
            status: reservation.status(),
            price_cents: reservation.price().cents(),
            coupon: coupon.map(|coupon| CouponSummary {
                id: coupon.id,
                code: coupon.code.clone(),
            }),
            note: reservation.note().as_str().to_owned(),
            created_at: reservation.created_at(),
            updated_at: reservation.updated_at(),
        }
    }
}

/// Compact row used when listing a user's reservations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationListItem {
    pub id: Uuid,
    pub resource_id: Uuid,
    pub resource_name: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: ReservationStatus,
    pub price_cents: i32,
}

impl From<&ReservationView> for ReservationListItem {
    fn from(view: &ReservationView) -> Self {
        Self {
            id: view.id,
            resource_id: view.resource.id,
            resource_name: view.resource.name.clone(),
            start_at: view.start_at,
            end_at: view.end_at,
            status: view.status,
            price_cents: view.price_cents,
        }
    }
}
