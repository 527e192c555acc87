//! Idempotency primitives for safe reservation retries.
//!
//! - [`IdempotencyKey`]: client token scoping deduplication per user.
//! - [`PayloadHash`]: SHA-256 of a canonicalized payload; used as the request
//!   fingerprint and as the stored response-body hash.
//! - [`IdempotencyRecord`]: durable ledger row and its state machine
//!   ([`IdempotencyRecord::resolve`]).
//! - [`IdempotencyClaim`] / [`ClaimOutcome`]: the atomic conditional insert.
//! - [`IdempotencyCompletion`]: the `processing → completed` transition
//!   written inside the reservation transaction.
//! - [`IdempotencyConfig`]: TTL and in-flight wait policy.
//!
//! # Payload Canonicalization
//!
//! To ensure semantically equivalent payloads produce identical hashes
//! regardless of whitespace or key ordering, payloads are canonicalized before
//! hashing:
//!
//! 1. JSON objects have their keys sorted recursively.
//! 2. The result is serialized to compact JSON (no whitespace).
//! 3. The SHA-256 hash is computed on the resulting bytes.

mod config;
mod endpoint;
mod key;
mod payload;
mod record;

pub use config::IdempotencyConfig;
pub use endpoint::{IdempotentEndpoint, ParseIdempotentEndpointError};
pub use key::{IDEMPOTENCY_KEY_MAX_LEN, IdempotencyKey, IdempotencyKeyValidationError};
pub use payload::{PayloadHash, PayloadHashError, canonicalize_and_hash, hash_serializable};
pub use record::{
    ClaimOutcome, IdempotencyClaim, IdempotencyCompletion, IdempotencyProtocolError,
    IdempotencyRecord, IdempotencyStatus, ParseIdempotencyStatusError, RecordResolution,
};
