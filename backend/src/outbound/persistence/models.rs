//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions into domain types live here so
//! the adapters stay thin.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{Integer, Nullable, Text, Timestamptz, Uuid as SqlUuid};
use uuid::Uuid;

use crate::domain::UserId;
use crate::domain::idempotency::{
    IdempotencyKey, IdempotencyRecord, IdempotencyStatus, IdempotentEndpoint, PayloadHash,
};
use crate::domain::reservation::{
    Coupon, CouponSummary, ReservationListItem, ReservationStatus, ReservationView, Resource,
    ResourceSummary,
};

use super::schema::{coupons, idempotency_records, notification_jobs, resources};

/// Row struct for reading from the resources table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = resources)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ResourceRow {
    pub id: Uuid,
    pub name: String,
    pub lead_time_minutes: i32,
    pub hourly_rate_cents: i32,
}

impl From<ResourceRow> for Resource {
    fn from(row: ResourceRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            lead_time_minutes: row.lead_time_minutes,
            hourly_rate_cents: row.hourly_rate_cents,
        }
    }
}

/// Row struct for reading from the coupons table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = coupons)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CouponRow {
    pub id: Uuid,
    pub code: String,
    pub amount_off_cents: Option<i64>,
    pub percent_off: Option<i16>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_to: Option<DateTime<Utc>>,
}

impl TryFrom<CouponRow> for Coupon {
    type Error = String;

    fn try_from(row: CouponRow) -> Result<Self, Self::Error> {
        let percent_off = row
            .percent_off
            .map(|pct| {
                u8::try_from(pct)
                    .ok()
                    .filter(|pct| *pct <= 100)
                    .ok_or_else(|| format!("coupon {} has percent_off {pct}", row.code))
            })
            .transpose()?;
        Ok(Self {
            id: row.id,
            code: row.code,
            amount_off_cents: row.amount_off_cents,
            percent_off,
            valid_from: row.valid_from,
            valid_to: row.valid_to,
        })
    }
}

/// Insertable struct for notification jobs.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = notification_jobs)]
pub(crate) struct NewNotificationJobRow<'a> {
    pub id: Uuid,
    pub kind: &'a str,
    pub payload: &'a serde_json::Value,
    pub run_at: DateTime<Utc>,
}

/// Row struct for reading from the idempotency_records table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = idempotency_records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct IdempotencyRecordRow {
    pub key: String,
    pub user_id: Uuid,
    pub endpoint: String,
    pub request_hash: Vec<u8>,
    pub status: String,
    pub response_body_hash: Option<Vec<u8>>,
    pub result_reservation_id: Option<Uuid>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<IdempotencyRecordRow> for IdempotencyRecord {
    type Error = String;

    fn try_from(row: IdempotencyRecordRow) -> Result<Self, Self::Error> {
        let key = IdempotencyKey::new(&row.key).map_err(|err| err.to_string())?;
        let endpoint = IdempotentEndpoint::from_str(&row.endpoint).map_err(|err| err.to_string())?;
        let status = IdempotencyStatus::from_str(&row.status).map_err(|err| err.to_string())?;
        let request_hash = PayloadHash::try_from_bytes(&row.request_hash)
            .map_err(|err| format!("corrupted request hash: {err}"))?;
        let response_body_hash = row
            .response_body_hash
            .as_deref()
            .map(PayloadHash::try_from_bytes)
            .transpose()
            .map_err(|err| format!("corrupted response hash: {err}"))?;

        Ok(Self {
            key,
            user_id: UserId::from_uuid(row.user_id),
            endpoint,
            request_hash,
            status,
            response_body_hash,
            result_reservation_id: row.result_reservation_id,
            expires_at: row.expires_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Joined reservation row returned by the view query.
#[derive(Debug, Clone, QueryableByName)]
pub(crate) struct ReservationViewRow {
    #[diesel(sql_type = SqlUuid)]
    pub id: Uuid,
    #[diesel(sql_type = SqlUuid)]
    pub resource_id: Uuid,
    #[diesel(sql_type = Text)]
    pub resource_name: String,
    #[diesel(sql_type = SqlUuid)]
    pub user_id: Uuid,
    #[diesel(sql_type = Timestamptz)]
    pub start_at: DateTime<Utc>,
    #[diesel(sql_type = Timestamptz)]
    pub end_at: DateTime<Utc>,
    #[diesel(sql_type = Text)]
    pub status: String,
    #[diesel(sql_type = Integer)]
    pub price_cents: i32,
    #[diesel(sql_type = Nullable<SqlUuid>)]
    pub coupon_id: Option<Uuid>,
    #[diesel(sql_type = Nullable<Text>)]
    pub coupon_code: Option<String>,
    #[diesel(sql_type = Text)]
    pub note: String,
    #[diesel(sql_type = Timestamptz)]
    pub created_at: DateTime<Utc>,
    #[diesel(sql_type = Timestamptz)]
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ReservationViewRow> for ReservationView {
    type Error = String;

    fn try_from(row: ReservationViewRow) -> Result<Self, Self::Error> {
        let status = ReservationStatus::from_str(&row.status).map_err(|err| err.to_string())?;
        let coupon = match (row.coupon_id, row.coupon_code) {
            (Some(id), Some(code)) => Some(CouponSummary { id, code }),
            (None, _) => None,
            (Some(id), None) => return Err(format!("reservation references missing coupon {id}")),
        };
        Ok(Self {
            id: row.id,
            resource: ResourceSummary {
                id: row.resource_id,
                name: row.resource_name,
            },
            user_id: UserId::from_uuid(row.user_id),
            start_at: row.start_at,
            end_at: row.end_at,
            status,
            price_cents: row.price_cents,
            coupon,
            note: row.note,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Compact reservation row returned by the listing query.
#[derive(Debug, Clone, QueryableByName)]
pub(crate) struct ReservationListRow {
    #[diesel(sql_type = SqlUuid)]
    pub id: Uuid,
    #[diesel(sql_type = SqlUuid)]
    pub resource_id: Uuid,
    #[diesel(sql_type = Text)]
    pub resource_name: String,
    #[diesel(sql_type = Timestamptz)]
    pub start_at: DateTime<Utc>,
    #[diesel(sql_type = Timestamptz)]
    pub end_at: DateTime<Utc>,
    #[diesel(sql_type = Text)]
    pub status: String,
    #[diesel(sql_type = Integer)]
    pub price_cents: i32,
}

impl TryFrom<ReservationListRow> for ReservationListItem {
    type Error = String;

    fn try_from(row: ReservationListRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            resource_id: row.resource_id,
            resource_name: row.resource_name,
            start_at: row.start_at,
            end_at: row.end_at,
            status: ReservationStatus::from_str(&row.status).map_err(|err| err.to_string())?,
            price_cents: row.price_cents,
        })
    }
}
