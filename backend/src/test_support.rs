//! In-memory adapters for integration tests.
//!
//! [`InMemoryReservationStore`] implements every reservation port over one
//! mutex-guarded state, reproducing the database guarantees the service
//! relies on: the idempotency claim is atomic, confirmed reservations on the
//! same resource never overlap, and a commit writes all of its rows or none.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;
use uuid::Uuid;

use crate::domain::UserId;
use crate::domain::idempotency::{
    ClaimOutcome, IdempotencyClaim, IdempotencyKey, IdempotencyRecord, IdempotencyStatus,
};
use crate::domain::notification::NotificationJob;
use crate::domain::ports::{
    CouponRepository, CouponRepositoryError, IdempotencyRepository, IdempotencyRepositoryError,
    ReservationCommit, ReservationRepository, ReservationRepositoryError, ReservationUnitOfWork,
    ReservationUnitOfWorkError, ResourceRepository, ResourceRepositoryError,
};
use crate::domain::reservation::{
    Coupon, Reservation, ReservationListItem, ReservationStatus, ReservationView, Resource,
};

/// Clock whose time only moves when told to.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: Duration) {
        let delta = match TimeDelta::from_std(delta) {
            Ok(delta) => delta,
            Err(error) => panic!("duration out of range: {error}; delta={delta:?}"),
        };
        *self.lock_clock() += delta;
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

type LedgerKey = (String, Uuid);

#[derive(Default)]
struct StoreState {
    resources: HashMap<Uuid, Resource>,
    coupons: HashMap<String, Coupon>,
    reservations: Vec<Reservation>,
    jobs: Vec<NotificationJob>,
    ledger: HashMap<LedgerKey, IdempotencyRecord>,
}

impl StoreState {
    fn view_of(&self, reservation: &Reservation) -> Option<ReservationView> {
        let resource = self.resources.get(&reservation.resource_id())?;
        let coupon = reservation
            .coupon_id()
            .and_then(|id| self.coupons.values().find(|coupon| coupon.id == id));
        Some(ReservationView::project(reservation, resource, coupon))
    }

    fn overlaps_confirmed(&self, candidate: &Reservation) -> bool {
        candidate.status() == ReservationStatus::Confirmed
            && self.reservations.iter().any(|existing| {
                existing.status() == ReservationStatus::Confirmed
                    && existing.resource_id() == candidate.resource_id()
                    && existing.time_slot().overlaps(candidate.time_slot())
            })
    }
}

fn ledger_key(key: &IdempotencyKey, user_id: &UserId) -> LedgerKey {
    (key.as_str().to_owned(), *user_id.as_uuid())
}

/// Shared in-memory implementation of all reservation ports.
#[derive(Default)]
pub struct InMemoryReservationStore {
    state: Mutex<StoreState>,
    commit_delay: Option<Duration>,
}

impl InMemoryReservationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep before each commit, widening the window in which a second
    /// request observes the claim as in flight.
    #[must_use]
    pub fn with_commit_delay(mut self, delay: Duration) -> Self {
        self.commit_delay = Some(delay);
        self
    }

    pub fn insert_resource(&self, resource: Resource) {
        self.lock().resources.insert(resource.id, resource);
    }

    pub fn insert_coupon(&self, coupon: Coupon) {
        self.lock().coupons.insert(coupon.code.clone(), coupon);
    }

    /// Every stored reservation, in insertion order.
    pub fn reservations(&self) -> Vec<Reservation> {
        self.lock().reservations.clone()
    }

    /// Every queued notification job, in insertion order.
    pub fn notification_jobs(&self) -> Vec<NotificationJob> {
        self.lock().jobs.clone()
    }

    /// The ledger row for `(key, user)`, expired or not.
    pub fn idempotency_record(
        &self,
        key: &IdempotencyKey,
        user_id: &UserId,
    ) -> Option<IdempotencyRecord> {
        self.lock().ledger.get(&ledger_key(key, user_id)).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("store mutex"),
        }
    }
}

#[async_trait]
impl ResourceRepository for InMemoryReservationStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Resource>, ResourceRepositoryError> {
        Ok(self.lock().resources.get(&id).cloned())
    }
}

#[async_trait]
impl CouponRepository for InMemoryReservationStore {
    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, CouponRepositoryError> {
        Ok(self.lock().coupons.get(code).cloned())
    }
}

#[async_trait]
impl ReservationRepository for InMemoryReservationStore {
    async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<ReservationView>, ReservationRepositoryError> {
        let state = self.lock();
        Ok(state
            .reservations
            .iter()
            .find(|reservation| reservation.id() == id)
            .and_then(|reservation| state.view_of(reservation)))
    }

    async fn find_by_user_id(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ReservationListItem>, ReservationRepositoryError> {
        let state = self.lock();
        let mut items: Vec<ReservationListItem> = state
            .reservations
            .iter()
            .filter(|reservation| reservation.user_id() == user_id)
            .filter_map(|reservation| state.view_of(reservation))
            .map(|view| ReservationListItem::from(&view))
            .collect();
        items.sort_by(|a, b| b.start_at.cmp(&a.start_at).then(a.id.cmp(&b.id)));
        Ok(items)
    }
}

#[async_trait]
impl IdempotencyRepository for InMemoryReservationStore {
    async fn try_insert(
        &self,
        claim: &IdempotencyClaim,
    ) -> Result<ClaimOutcome, IdempotencyRepositoryError> {
        let mut state = self.lock();
        let key = ledger_key(&claim.key, &claim.user_id);
        if state
            .ledger
            .get(&key)
            .is_some_and(|record| !record.is_expired_at(claim.now))
        {
            return Ok(ClaimOutcome::AlreadyExists);
        }
        state.ledger.insert(
            key,
            IdempotencyRecord {
                key: claim.key.clone(),
                user_id: claim.user_id.clone(),
                endpoint: claim.endpoint,
                request_hash: claim.request_hash.clone(),
                status: IdempotencyStatus::Processing,
                response_body_hash: None,
                result_reservation_id: None,
                expires_at: claim.expires_at,
                created_at: claim.now,
                updated_at: claim.now,
            },
        );
        Ok(ClaimOutcome::Claimed)
    }

    async fn get(
        &self,
        key: &IdempotencyKey,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<IdempotencyRecord>, IdempotencyRepositoryError> {
        Ok(self
            .lock()
            .ledger
            .get(&ledger_key(key, user_id))
            .filter(|record| !record.is_expired_at(now))
            .cloned())
    }

    async fn release(&self, claim: &IdempotencyClaim) -> Result<(), IdempotencyRepositoryError> {
        let mut state = self.lock();
        let key = ledger_key(&claim.key, &claim.user_id);
        if state.ledger.get(&key).is_some_and(|record| {
            record.status == IdempotencyStatus::Processing
                && record.request_hash == claim.request_hash
                && record.created_at == claim.now
        }) {
            state.ledger.remove(&key);
        }
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, IdempotencyRepositoryError> {
        let mut state = self.lock();
        let before = state.ledger.len();
        state.ledger.retain(|_, record| !record.is_expired_at(now));
        Ok(u64::try_from(before - state.ledger.len()).unwrap_or(u64::MAX))
    }
}

#[async_trait]
impl ReservationUnitOfWork for InMemoryReservationStore {
    async fn commit(&self, commit: &ReservationCommit) -> Result<(), ReservationUnitOfWorkError> {
        if let Some(delay) = self.commit_delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.lock();
        if state.overlaps_confirmed(&commit.reservation) {
            return Err(ReservationUnitOfWorkError::overlap(
                "reservations_no_overlap",
            ));
        }
        let completion = &commit.completion;
        let key = ledger_key(&completion.key, &completion.user_id);
        let Some(record) = state.ledger.get_mut(&key).filter(|record| {
            record.status == IdempotencyStatus::Processing
                && record.request_hash == completion.request_hash
        }) else {
            return Err(ReservationUnitOfWorkError::claim_lost(completion.key.as_str()));
        };

        record.status = IdempotencyStatus::Completed;
        record.response_body_hash = Some(completion.response_body_hash.clone());
        record.result_reservation_id = Some(completion.reservation_id);
        record.updated_at = completion.completed_at;
        state.reservations.push(commit.reservation.clone());
        state.jobs.push(commit.notification.clone());
        Ok(())
    }
}
