//! Orchestration tests for reservation creation against mocked ports.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use mockable::Clock;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::idempotency::{IdempotencyRecord, IdempotencyStatus, canonicalize_and_hash};
use crate::domain::notification::JobKind;
use crate::domain::ports::{
    MockCouponRepository, MockIdempotencyRepository, MockReservationRepository,
    MockReservationUnitOfWork, MockResourceRepository,
};
use crate::domain::{ErrorCode, ErrorKind};

struct FixtureClock {
    utc_now: DateTime<Utc>,
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

fn fixture_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, 10, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

fn room() -> Resource {
    Resource {
        id: Uuid::from_u128(0x0001),
        name: "Room A".into(),
        lead_time_minutes: 60,
        hourly_rate_cents: 1000,
    }
}

fn spring_coupon() -> Coupon {
    Coupon {
        id: Uuid::from_u128(0x0c0u128),
        code: "SPRING".into(),
        amount_off_cents: Some(200),
        percent_off: Some(10),
        valid_from: None,
        valid_to: None,
    }
}

fn request_starting_in(minutes: i64) -> CreateReservationRequest {
    let start_at = fixture_now() + Duration::minutes(minutes);
    CreateReservationRequest {
        resource_id: room().id,
        start_at,
        end_at: start_at + Duration::minutes(90),
        coupon_code: None,
        note: "  window seat ".into(),
    }
}

#[fixture]
fn requester() -> Requester {
    Requester::new(UserId::random(), "ada@example.test").expect("valid requester")
}

#[fixture]
fn key() -> IdempotencyKey {
    IdempotencyKey::new("create-1").expect("valid key")
}

struct Harness {
    resources: MockResourceRepository,
    coupons: MockCouponRepository,
    reservations: MockReservationRepository,
    idempotency: MockIdempotencyRepository,
    unit_of_work: MockReservationUnitOfWork,
    config: IdempotencyConfig,
    now: DateTime<Utc>,
}

type MockedService = CreateReservationService<
    MockResourceRepository,
    MockCouponRepository,
    MockReservationRepository,
    MockIdempotencyRepository,
    MockReservationUnitOfWork,
>;

impl Harness {
    fn new() -> Self {
        Self {
            resources: MockResourceRepository::new(),
            coupons: MockCouponRepository::new(),
            reservations: MockReservationRepository::new(),
            idempotency: MockIdempotencyRepository::new(),
            unit_of_work: MockReservationUnitOfWork::new(),
            config: IdempotencyConfig::default()
                .with_in_flight_wait(0, StdDuration::from_millis(0)),
            now: fixture_now(),
        }
    }

    fn claim_succeeds(mut self) -> Self {
        self.idempotency
            .expect_try_insert()
            .times(1)
            .returning(|_| Ok(ClaimOutcome::Claimed));
        self
    }

    fn knows_room(mut self) -> Self {
        self.resources
            .expect_find_by_id()
            .returning(|id| Ok((id == room().id).then(room)));
        self
    }

    fn expects_release(mut self) -> Self {
        self.idempotency
            .expect_release()
            .times(1)
            .withf(|claim| {
                claim.key.as_str() == "create-1"
                    && claim.endpoint == IdempotentEndpoint::CreateReservation
            })
            .returning(|_| Ok(()));
        self
    }

    fn existing_record(mut self, record: IdempotencyRecord) -> Self {
        self.idempotency
            .expect_try_insert()
            .times(1)
            .returning(|_| Ok(ClaimOutcome::AlreadyExists));
        self.idempotency
            .expect_get()
            .returning(move |_, _, _| Ok(Some(record.clone())));
        self
    }

    fn service(self) -> MockedService {
        CreateReservationService::new(
            ReservationPorts {
                resources: Arc::new(self.resources),
                coupons: Arc::new(self.coupons),
                reservations: Arc::new(self.reservations),
                idempotency: Arc::new(self.idempotency),
                unit_of_work: Arc::new(self.unit_of_work),
            },
            Arc::new(FixtureClock { utc_now: self.now }),
        )
        .with_idempotency_config(self.config)
    }
}

fn record_for(
    key: &IdempotencyKey,
    request: &CreateReservationRequest,
    status: IdempotencyStatus,
    result: Option<Uuid>,
) -> IdempotencyRecord {
    let now = fixture_now();
    IdempotencyRecord {
        key: key.clone(),
        user_id: UserId::random(),
        endpoint: IdempotentEndpoint::CreateReservation,
        request_hash: hash_serializable(&request.clone().normalized()).expect("request hashes"),
        status,
        response_body_hash: None,
        result_reservation_id: result,
        expires_at: now + Duration::hours(24),
        created_at: now,
        updated_at: now,
    }
}

fn stored_view(id: Uuid, requester: &Requester) -> ReservationView {
    let request = request_starting_in(120);
    ReservationView {
        id,
        resource: crate::domain::reservation::ResourceSummary {
            id: room().id,
            name: room().name,
        },
        user_id: requester.user_id().clone(),
        start_at: request.start_at,
        end_at: request.end_at,
        status: crate::domain::reservation::ReservationStatus::Confirmed,
        price_cents: 1500,
        coupon: None,
        note: "window seat".into(),
        created_at: fixture_now(),
        updated_at: fixture_now(),
    }
}

#[rstest]
#[tokio::test]
async fn fresh_request_commits_reservation_job_and_completion(
    requester: Requester,
    key: IdempotencyKey,
) {
    let mut harness = Harness::new().claim_succeeds().knows_room();
    let email = requester.email().to_owned();
    let expected_key = key.clone();
    harness
        .unit_of_work
        .expect_commit()
        .times(1)
        .withf(move |commit| {
            let job = &commit.notification;
            commit.completion.reservation_id == commit.reservation.id()
                && commit.completion.key == expected_key
                && job.kind == JobKind::ReservationCreated
                && job.run_at == fixture_now()
                && job.payload["user_email"] == email.as_str()
                && job.payload["resource_name"] == "Room A"
        })
        .returning(|_| Ok(()));
    let service = harness.service();

    let outcome = service
        .create(
            CreateReservationCommand {
                requester,
                request: request_starting_in(120),
            },
            key,
        )
        .await
        .expect("reservation is created");

    let CreateReservationOutcome::Created(view) = outcome else {
        panic!("expected a created outcome, got {outcome:?}");
    };
    assert_eq!(view.price_cents, 1500);
    assert_eq!(view.note, "window seat");
    assert_eq!(view.resource.name, "Room A");
}

#[rstest]
#[tokio::test]
async fn coupon_discount_is_applied_before_commit(requester: Requester, key: IdempotencyKey) {
    let mut harness = Harness::new().claim_succeeds().knows_room();
    harness
        .coupons
        .expect_find_by_code()
        .withf(|code| code == "SPRING")
        .returning(|_| Ok(Some(spring_coupon())));
    harness
        .unit_of_work
        .expect_commit()
        .withf(|commit| commit.reservation.coupon_id() == Some(spring_coupon().id))
        .returning(|_| Ok(()));
    let mut request = request_starting_in(120);
    request.coupon_code = Some(" SPRING ".into());

    let outcome = harness
        .service()
        .create(CreateReservationCommand { requester, request }, key)
        .await
        .expect("reservation is created");

    let view = outcome.view().expect("created view");
    // (1500 - 200) * 90%
    assert_eq!(view.price_cents, 1170);
    assert_eq!(view.coupon.as_ref().map(|c| c.code.as_str()), Some("SPRING"));
}

#[rstest]
#[case(30, true)]
#[case(90, false)]
#[tokio::test]
async fn lead_time_is_enforced_and_claim_released(
    requester: Requester,
    key: IdempotencyKey,
    #[case] starts_in_minutes: i64,
    #[case] rejected: bool,
) {
    let mut harness = Harness::new().claim_succeeds().knows_room();
    if rejected {
        harness = harness.expects_release();
    } else {
        harness
            .unit_of_work
            .expect_commit()
            .returning(|_| Ok(()));
    }

    let result = harness
        .service()
        .create(
            CreateReservationCommand {
                requester,
                request: request_starting_in(starts_in_minutes),
            },
            key,
        )
        .await;

    if rejected {
        let err = result.expect_err("lead time not met");
        assert_eq!(err.code(), ErrorCode::LeadTimeNotMet);
        assert_eq!(err.phase(), Some(Phase::DomainConstruction));
    } else {
        assert!(matches!(result, Ok(CreateReservationOutcome::Created(_))));
    }
}

#[rstest]
#[tokio::test]
async fn unknown_resource_is_not_found(requester: Requester, key: IdempotencyKey) {
    let mut harness = Harness::new().claim_succeeds().expects_release();
    harness
        .resources
        .expect_find_by_id()
        .returning(|_| Ok(None));

    let err = harness
        .service()
        .create(
            CreateReservationCommand {
                requester,
                request: request_starting_in(120),
            },
            key,
        )
        .await
        .expect_err("resource is unknown");

    assert_eq!(err.code(), ErrorCode::ResourceNotFound);
    assert!(err.is_kind(ErrorKind::NotFound));
}

#[rstest]
#[tokio::test]
async fn unknown_coupon_is_not_found(requester: Requester, key: IdempotencyKey) {
    let mut harness = Harness::new().claim_succeeds().knows_room().expects_release();
    harness
        .coupons
        .expect_find_by_code()
        .returning(|_| Ok(None));
    let mut request = request_starting_in(120);
    request.coupon_code = Some("NOPE".into());

    let err = harness
        .service()
        .create(CreateReservationCommand { requester, request }, key)
        .await
        .expect_err("coupon is unknown");

    assert_eq!(err.code(), ErrorCode::CouponNotFound);
}

#[rstest]
#[tokio::test]
async fn overlap_on_commit_is_a_conflict(requester: Requester, key: IdempotencyKey) {
    let mut harness = Harness::new().claim_succeeds().knows_room().expects_release();
    harness
        .unit_of_work
        .expect_commit()
        .returning(|_| Err(ReservationUnitOfWorkError::overlap("reservations_no_overlap")));

    let err = harness
        .service()
        .create(
            CreateReservationCommand {
                requester,
                request: request_starting_in(120),
            },
            key,
        )
        .await
        .expect_err("slot overlaps");

    assert_eq!(err.code(), ErrorCode::ReservationConflict);
    assert_eq!(err.phase(), Some(Phase::DatabaseOperation));
}

#[rstest]
#[tokio::test]
async fn failed_commit_releases_exactly_the_claim_it_inserted(
    requester: Requester,
    key: IdempotencyKey,
) {
    let mut harness = Harness::new().knows_room();
    let inserted = Arc::new(Mutex::new(None::<IdempotencyClaim>));
    let recorder = Arc::clone(&inserted);
    harness
        .idempotency
        .expect_try_insert()
        .times(1)
        .returning(move |claim| {
            *recorder.lock().expect("claim slot") = Some(claim.clone());
            Ok(ClaimOutcome::Claimed)
        });
    let expected = Arc::clone(&inserted);
    harness
        .idempotency
        .expect_release()
        .times(1)
        .withf(move |claim| expected.lock().expect("claim slot").as_ref() == Some(claim))
        .returning(|_| Ok(()));
    harness
        .unit_of_work
        .expect_commit()
        .returning(|_| Err(ReservationUnitOfWorkError::overlap("reservations_no_overlap")));

    let err = harness
        .service()
        .create(
            CreateReservationCommand {
                requester,
                request: request_starting_in(120),
            },
            key,
        )
        .await
        .expect_err("slot overlaps");

    assert_eq!(err.code(), ErrorCode::ReservationConflict);
}

#[rstest]
#[tokio::test]
async fn lost_claim_is_not_released(requester: Requester, key: IdempotencyKey) {
    let mut harness = Harness::new().claim_succeeds().knows_room();
    harness
        .unit_of_work
        .expect_commit()
        .returning(|_| Err(ReservationUnitOfWorkError::claim_lost("create-1")));
    harness.idempotency.expect_release().times(0);

    let err = harness
        .service()
        .create(
            CreateReservationCommand {
                requester,
                request: request_starting_in(120),
            },
            key,
        )
        .await
        .expect_err("claim was lost");

    assert_eq!(err.code(), ErrorCode::DuplicateReservation);
}

#[rstest]
#[tokio::test]
async fn completed_record_replays_without_side_effects(
    requester: Requester,
    key: IdempotencyKey,
) {
    let request = request_starting_in(120);
    let reservation_id = Uuid::new_v4();
    let view = stored_view(reservation_id, &requester);
    let mut harness = Harness::new().existing_record(record_for(
        &key,
        &request,
        IdempotencyStatus::Completed,
        Some(reservation_id),
    ));
    let stored = view.clone();
    harness
        .reservations
        .expect_find_by_id()
        .withf(move |id| *id == reservation_id)
        .returning(move |_| Ok(Some(stored.clone())));

    let outcome = harness
        .service()
        .create(CreateReservationCommand { requester, request }, key)
        .await
        .expect("replay succeeds");

    assert_eq!(outcome, CreateReservationOutcome::Replayed(view));
}

#[rstest]
#[case(IdempotencyStatus::Processing)]
#[case(IdempotencyStatus::Completed)]
#[tokio::test]
async fn different_body_with_same_key_is_duplicate(
    requester: Requester,
    key: IdempotencyKey,
    #[case] status: IdempotencyStatus,
) {
    let original = request_starting_in(120);
    let harness = Harness::new().existing_record(record_for(
        &key,
        &original,
        status,
        Some(Uuid::new_v4()),
    ));
    let mut changed = original;
    changed.note = "aisle seat".into();

    let err = harness
        .service()
        .create(
            CreateReservationCommand {
                requester,
                request: changed,
            },
            key,
        )
        .await
        .expect_err("body differs");

    assert_eq!(err.code(), ErrorCode::DuplicateReservation);
    assert_eq!(err.phase(), Some(Phase::IdempotencyCheck));
}

#[rstest]
#[tokio::test]
async fn completed_record_without_result_is_internal(requester: Requester, key: IdempotencyKey) {
    let request = request_starting_in(120);
    let harness = Harness::new().existing_record(record_for(
        &key,
        &request,
        IdempotencyStatus::Completed,
        None,
    ));

    let err = harness
        .service()
        .create(CreateReservationCommand { requester, request }, key)
        .await
        .expect_err("record is corrupt");

    assert_eq!(err.code(), ErrorCode::InternalError);
    assert!(err.is_kind(ErrorKind::Internal));
}

#[rstest]
#[tokio::test]
async fn in_flight_record_reports_in_progress(requester: Requester, key: IdempotencyKey) {
    let request = request_starting_in(120);
    let harness = Harness::new().existing_record(record_for(
        &key,
        &request,
        IdempotencyStatus::Processing,
        None,
    ));

    let outcome = harness
        .service()
        .create(CreateReservationCommand { requester, request }, key)
        .await
        .expect("in-flight requests are not errors");

    assert_eq!(outcome, CreateReservationOutcome::InProgress);
}

#[rstest]
#[tokio::test]
async fn in_flight_record_is_replayed_once_completed(requester: Requester, key: IdempotencyKey) {
    let request = request_starting_in(120);
    let reservation_id = Uuid::new_v4();
    let processing = record_for(&key, &request, IdempotencyStatus::Processing, None);
    let mut completed = processing.clone();
    completed.status = IdempotencyStatus::Completed;
    completed.result_reservation_id = Some(reservation_id);

    let mut harness = Harness::new();
    harness.config = IdempotencyConfig::default().with_in_flight_wait(3, StdDuration::ZERO);
    harness
        .idempotency
        .expect_try_insert()
        .returning(|_| Ok(ClaimOutcome::AlreadyExists));
    let reads = AtomicUsize::new(0);
    harness.idempotency.expect_get().returning(move |_, _, _| {
        let record = if reads.fetch_add(1, Ordering::SeqCst) < 2 {
            processing.clone()
        } else {
            completed.clone()
        };
        Ok(Some(record))
    });
    let view = stored_view(reservation_id, &requester);
    let stored = view.clone();
    harness
        .reservations
        .expect_find_by_id()
        .returning(move |_| Ok(Some(stored.clone())));

    let outcome = harness
        .service()
        .create(CreateReservationCommand { requester, request }, key)
        .await
        .expect("waiting succeeds");

    assert_eq!(outcome, CreateReservationOutcome::Replayed(view));
}

#[rstest]
#[tokio::test]
async fn record_expiring_between_insert_and_read_is_reclaimed(
    requester: Requester,
    key: IdempotencyKey,
) {
    let mut harness = Harness::new().knows_room();
    let attempts = AtomicUsize::new(0);
    harness
        .idempotency
        .expect_try_insert()
        .times(2)
        .returning(move |_| {
            if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(ClaimOutcome::AlreadyExists)
            } else {
                Ok(ClaimOutcome::Claimed)
            }
        });
    harness
        .idempotency
        .expect_get()
        .times(1)
        .returning(|_, _, _| Ok(None));
    harness
        .unit_of_work
        .expect_commit()
        .returning(|_| Ok(()));

    let outcome = harness
        .service()
        .create(
            CreateReservationCommand {
                requester,
                request: request_starting_in(120),
            },
            key,
        )
        .await
        .expect("second claim succeeds");

    assert!(matches!(outcome, CreateReservationOutcome::Created(_)));
}

#[rstest]
fn request_fingerprint_ignores_absent_coupon() {
    let request = request_starting_in(120);
    let value = serde_json::to_value(&request).expect("request serializes");
    assert!(value.get("couponCode").is_none());
    assert_eq!(
        hash_serializable(&request).expect("hashes"),
        canonicalize_and_hash(&value)
    );
}

#[rstest]
#[tokio::test]
async fn timestamps_are_truncated_to_microseconds(requester: Requester, key: IdempotencyKey) {
    let mut harness = Harness::new().knows_room();
    harness.now = fixture_now() + Duration::nanoseconds(123_456_789);
    let stored_now = fixture_now() + Duration::microseconds(123_456);
    harness
        .idempotency
        .expect_try_insert()
        .times(1)
        .withf(move |claim| claim.now == stored_now)
        .returning(|_| Ok(ClaimOutcome::Claimed));
    harness
        .unit_of_work
        .expect_commit()
        .times(1)
        .withf(move |commit| {
            commit.completion.completed_at == stored_now && commit.notification.run_at == stored_now
        })
        .returning(|_| Ok(()));
    let mut request = request_starting_in(120);
    request.start_at += Duration::nanoseconds(999);
    request.end_at += Duration::nanoseconds(1_001);

    let outcome = harness
        .service()
        .create(CreateReservationCommand { requester, request }, key)
        .await
        .expect("reservation is created");

    let view = outcome.view().expect("created view");
    let expected_start = fixture_now() + Duration::minutes(120);
    assert_eq!(view.created_at, stored_now);
    assert_eq!(view.updated_at, stored_now);
    assert_eq!(view.start_at, expected_start);
    assert_eq!(
        view.end_at,
        expected_start + Duration::minutes(90) + Duration::microseconds(1)
    );
}

#[rstest]
#[tokio::test]
async fn padded_coupon_code_replays_under_the_same_key(
    requester: Requester,
    key: IdempotencyKey,
) {
    let mut original = request_starting_in(120);
    original.coupon_code = Some("SPRING".into());
    let reservation_id = Uuid::new_v4();
    let view = stored_view(reservation_id, &requester);
    let mut harness = Harness::new().existing_record(record_for(
        &key,
        &original,
        IdempotencyStatus::Completed,
        Some(reservation_id),
    ));
    let stored = view.clone();
    harness
        .reservations
        .expect_find_by_id()
        .returning(move |_| Ok(Some(stored.clone())));
    let mut padded = original;
    padded.coupon_code = Some("  SPRING ".into());
    padded.note = "window seat".into();

    let outcome = harness
        .service()
        .create(
            CreateReservationCommand {
                requester,
                request: padded,
            },
            key,
        )
        .await
        .expect("normalised body matches");

    assert_eq!(outcome, CreateReservationOutcome::Replayed(view));
}

#[rstest]
#[case(None, None)]
#[case(Some("   "), None)]
#[case(Some(" SPRING\t"), Some("SPRING"))]
fn normalized_request_trims_text_and_time(
    #[case] coupon_code: Option<&str>,
    #[case] expected: Option<&str>,
) {
    let mut request = request_starting_in(120);
    request.coupon_code = coupon_code.map(str::to_owned);
    request.start_at += Duration::nanoseconds(1_500);

    let normalized = request.normalized();

    assert_eq!(normalized.coupon_code.as_deref(), expected);
    assert_eq!(normalized.note, "window seat");
    assert_eq!(
        normalized.start_at,
        fixture_now() + Duration::minutes(120) + Duration::microseconds(1)
    );
}
