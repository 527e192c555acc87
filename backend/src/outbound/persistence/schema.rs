//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. The
//! `reservations` table is absent on purpose: its `slot` column is a
//! `tstzrange` guarded by an exclusion constraint, so the reservation
//! adapters address it through raw SQL (`sql_query`) instead.

diesel::table! {
    /// Bookable resources.
    resources (id) {
        id -> Uuid,
        name -> Text,
        /// Minimum advance notice; negative values mean none.
        lead_time_minutes -> Int4,
        hourly_rate_cents -> Int4,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Discount coupons. Read-only for this service.
    coupons (id) {
        id -> Uuid,
        code -> Text,
        amount_off_cents -> Nullable<Int8>,
        percent_off -> Nullable<Int2>,
        valid_from -> Nullable<Timestamptz>,
        valid_to -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Notification jobs consumed by an external dispatcher.
    notification_jobs (id) {
        id -> Uuid,
        kind -> Text,
        payload -> Jsonb,
        run_at -> Timestamptz,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Idempotency ledger keyed by `(key, user_id)`.
    idempotency_records (key, user_id) {
        key -> Text,
        user_id -> Uuid,
        endpoint -> Text,
        /// SHA-256 of the canonical request body (32 bytes).
        request_hash -> Bytea,
        /// `processing` or `completed`.
        status -> Text,
        response_body_hash -> Nullable<Bytea>,
        result_reservation_id -> Nullable<Uuid>,
        expires_at -> Timestamptz,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}
