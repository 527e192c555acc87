//! Behaviour of the fixture port implementations.

use super::*;
use crate::domain::UserId;
use crate::domain::idempotency::{
    ClaimOutcome, IdempotencyClaim, IdempotencyKey, IdempotentEndpoint, canonicalize_and_hash,
};
use chrono::{Duration, Utc};
use rstest::rstest;
use serde_json::json;
use uuid::Uuid;

#[rstest]
#[tokio::test]
async fn fixture_lookups_find_nothing() {
    assert!(
        FixtureResourceRepository
            .find_by_id(Uuid::new_v4())
            .await
            .expect("fixture lookup succeeds")
            .is_none()
    );
    assert!(
        FixtureCouponRepository
            .find_by_code("SPRING")
            .await
            .expect("fixture lookup succeeds")
            .is_none()
    );
    assert!(
        FixtureReservationRepository
            .find_by_user_id(&UserId::random())
            .await
            .expect("fixture list succeeds")
            .is_empty()
    );
}

#[rstest]
#[tokio::test]
async fn fixture_idempotency_repository_always_claims() {
    let now = Utc::now();
    let claim = IdempotencyClaim {
        key: IdempotencyKey::random(),
        user_id: UserId::random(),
        endpoint: IdempotentEndpoint::CreateReservation,
        request_hash: canonicalize_and_hash(&json!({"slot": 1})),
        now,
        expires_at: now + Duration::hours(24),
    };
    let repo = FixtureIdempotencyRepository;

    let outcome = repo.try_insert(&claim).await.expect("claim succeeds");
    assert_eq!(outcome, ClaimOutcome::Claimed);
    assert!(
        repo.get(&claim.key, &claim.user_id, now)
            .await
            .expect("get succeeds")
            .is_none()
    );
    repo.release(&claim).await.expect("release succeeds");
    assert_eq!(repo.purge_expired(now).await.expect("purge succeeds"), 0);
}

#[rstest]
fn unit_of_work_errors_render_context() {
    let err = ReservationUnitOfWorkError::claim_lost("k-1");
    assert_eq!(
        err.to_string(),
        "idempotency claim for key k-1 was lost before commit"
    );
}
