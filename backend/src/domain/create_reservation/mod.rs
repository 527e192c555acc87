//! Idempotent reservation creation.
//!
//! [`CreateReservationService::create`] runs the full write path:
//!
//! 1. normalise the request body and fingerprint it ([`hash_serializable`]);
//! 2. claim `(key, user)` in the idempotency ledger, replaying or waiting
//!    when the key is already known;
//! 3. load the resource and coupon, then build the aggregate through
//!    [`ReservationFactory`];
//! 4. hand the reservation, its notification job, and the idempotency
//!    completion to [`ReservationUnitOfWork::commit`], which writes all three
//!    in one transaction.
//!
//! A fresh attempt that fails before commit releases its claim so the client
//! can retry with the same key.

use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::idempotency::{
    ClaimOutcome, IdempotencyClaim, IdempotencyCompletion, IdempotencyConfig, IdempotencyKey,
    IdempotentEndpoint, PayloadHash, RecordResolution, hash_serializable,
};
use crate::domain::notification::{NotificationJob, ReservationCreatedPayload};
use crate::domain::ports::{
    CouponRepository, IdempotencyRepository, ReservationCommit, ReservationRepository,
    ReservationUnitOfWork, ReservationUnitOfWorkError, ResourceRepository,
};
use crate::domain::reservation::{
    Coupon, Note, ReservationDraft, ReservationFactory, ReservationView, Resource, TimeSlot,
};
use crate::domain::reservation_service_support::{
    expiry_after, map_coupon_error, map_idempotency_error, map_reservation_read_error,
    map_resource_error, map_unit_of_work_error,
};
use crate::domain::{Error, Phase, Requester, UserId};

/// Request body for reservation creation.
///
/// Its [normalised](Self::normalized) form is the payload fingerprinted for
/// idempotency, so two requests are "the same" exactly when their normalised
/// canonical JSON matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationRequest {
    pub resource_id: Uuid,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub note: String,
}

impl CreateReservationRequest {
    /// The request as the service interprets it.
    ///
    /// The coupon code and note lose surrounding whitespace, a blank coupon
    /// code becomes `None`, and the slot bounds are truncated to whole
    /// microseconds. Two bodies that normalise alike are the same request.
    #[must_use]
    pub fn normalized(self) -> Self {
        let coupon_code = self
            .coupon_code
            .map(|code| code.trim().to_owned())
            .filter(|code| !code.is_empty());
        Self {
            resource_id: self.resource_id,
            start_at: self.start_at.trunc_subsecs(6),
            end_at: self.end_at.trunc_subsecs(6),
            coupon_code,
            note: self.note.trim().to_owned(),
        }
    }
}

/// Request body plus the authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateReservationCommand {
    pub requester: Requester,
    pub request: CreateReservationRequest,
}

/// Result of a create call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateReservationOutcome {
    /// This call created the reservation.
    Created(ReservationView),
    /// An earlier call with the same key and body already created it.
    Replayed(ReservationView),
    /// Another call with the same key and body is still running.
    InProgress,
}

impl CreateReservationOutcome {
    /// The reservation view, unless the outcome is still pending.
    pub fn view(&self) -> Option<&ReservationView> {
        match self {
            Self::Created(view) | Self::Replayed(view) => Some(view),
            Self::InProgress => None,
        }
    }
}

/// Driven ports used by [`CreateReservationService`].
#[derive(Clone)]
pub struct ReservationPorts<R, C, V, I, U> {
    pub resources: Arc<R>,
    pub coupons: Arc<C>,
    pub reservations: Arc<V>,
    pub idempotency: Arc<I>,
    pub unit_of_work: Arc<U>,
}

enum ClaimState {
    Fresh,
    Completed(Uuid),
    InFlight,
}

/// Reservation write orchestrator.
#[derive(Clone)]
pub struct CreateReservationService<R, C, V, I, U> {
    ports: ReservationPorts<R, C, V, I, U>,
    clock: Arc<dyn Clock>,
    factory: ReservationFactory,
    config: IdempotencyConfig,
}

impl<R, C, V, I, U> CreateReservationService<R, C, V, I, U> {
    /// Create a service with the default factory and idempotency policy.
    ///
    /// ```rust,no_run
    /// # use std::sync::Arc;
    /// # use mockable::DefaultClock;
    /// # use reservations::domain::ports::*;
    /// # use reservations::domain::{CreateReservationService, ReservationPorts};
    /// let service = CreateReservationService::new(
    ///     ReservationPorts {
    ///         resources: Arc::new(FixtureResourceRepository),
    ///         coupons: Arc::new(FixtureCouponRepository),
    ///         reservations: Arc::new(FixtureReservationRepository),
    ///         idempotency: Arc::new(FixtureIdempotencyRepository),
    ///         unit_of_work: Arc::new(FixtureReservationUnitOfWork),
    ///     },
    ///     Arc::new(DefaultClock),
    /// );
    /// # let _ = service;
    /// ```
    pub fn new(ports: ReservationPorts<R, C, V, I, U>, clock: Arc<dyn Clock>) -> Self {
        Self {
            ports,
            clock,
            factory: ReservationFactory::default(),
            config: IdempotencyConfig::default(),
        }
    }

    /// Replace the reservation factory (and with it the pricing strategy).
    #[must_use]
    pub fn with_factory(mut self, factory: ReservationFactory) -> Self {
        self.factory = factory;
        self
    }

    #[must_use]
    pub fn with_idempotency_config(mut self, config: IdempotencyConfig) -> Self {
        self.config = config;
        self
    }
}

impl<R, C, V, I, U> CreateReservationService<R, C, V, I, U>
where
    R: ResourceRepository,
    C: CouponRepository,
    V: ReservationRepository,
    I: IdempotencyRepository,
    U: ReservationUnitOfWork,
{
    /// Create a reservation, or replay the result of an earlier identical
    /// request sent with the same idempotency key.
    ///
    /// # Errors
    ///
    /// - validation codes when the slot, note, price, or coupon is unusable;
    /// - `ResourceNotFound` / `CouponNotFound` for unknown references;
    /// - `ReservationConflict` when the slot overlaps a confirmed booking;
    /// - `DuplicateReservation` when the key is bound to a different body;
    /// - `DatabaseOperationFailed` for storage failures.
    #[tracing::instrument(
        skip_all,
        fields(
            user_id = %command.requester.user_id(),
            idempotency_key = %key,
            resource_id = %command.request.resource_id,
        )
    )]
    pub async fn create(
        &self,
        command: CreateReservationCommand,
        key: IdempotencyKey,
    ) -> Result<CreateReservationOutcome, Error> {
        let CreateReservationCommand { requester, request } = command;
        let request = request.normalized();
        let request_hash = hash_serializable(&request).map_err(|err| {
            Error::internal("failed to fingerprint reservation request")
                .with_phase(Phase::IdempotencyCheck)
                .with_source(err)
        })?;
        let claim = self.new_claim(key, requester.user_id(), request_hash)?;

        match self.claim(&claim).await? {
            ClaimState::Fresh => {}
            ClaimState::Completed(reservation_id) => {
                debug!(%reservation_id, "replaying completed reservation");
                return self
                    .replay(reservation_id)
                    .await
                    .map(CreateReservationOutcome::Replayed);
            }
            ClaimState::InFlight => {
                return self.await_in_flight(&claim).await;
            }
        }

        let now = self.now();
        let (commit, view) = match self.prepare(&requester, &request, &claim, now).await {
            Ok(prepared) => prepared,
            Err(err) => {
                self.release_claim(&claim).await;
                return Err(err);
            }
        };

        match self.ports.unit_of_work.commit(&commit).await {
            Ok(()) => {
                info!(
                    reservation_id = %view.id,
                    price_cents = view.price_cents,
                    "reservation created"
                );
                Ok(CreateReservationOutcome::Created(view))
            }
            // The ledger row now belongs to another request; leave it alone.
            Err(err @ ReservationUnitOfWorkError::ClaimLost { .. }) => {
                Err(map_unit_of_work_error(err))
            }
            Err(err) => {
                self.release_claim(&claim).await;
                Err(map_unit_of_work_error(err))
            }
        }
    }

    /// Current time at the precision PostgreSQL stores.
    fn now(&self) -> DateTime<Utc> {
        self.clock.utc().trunc_subsecs(6)
    }

    fn new_claim(
        &self,
        key: IdempotencyKey,
        user_id: &UserId,
        request_hash: PayloadHash,
    ) -> Result<IdempotencyClaim, Error> {
        let now = self.now();
        Ok(IdempotencyClaim {
            key,
            user_id: user_id.clone(),
            endpoint: IdempotentEndpoint::CreateReservation,
            request_hash,
            now,
            expires_at: expiry_after(now, self.config.ttl())?,
        })
    }

    async fn claim(&self, claim: &IdempotencyClaim) -> Result<ClaimState, Error> {
        // A second round covers a live record expiring between the insert and
        // the read.
        for _ in 0..2 {
            let outcome = self
                .ports
                .idempotency
                .try_insert(claim)
                .await
                .map_err(map_idempotency_error)?;
            if outcome == ClaimOutcome::Claimed {
                debug!("idempotency key claimed");
                return Ok(ClaimState::Fresh);
            }

            let existing = self
                .ports
                .idempotency
                .get(&claim.key, &claim.user_id, claim.now)
                .await
                .map_err(map_idempotency_error)?;
            if let Some(record) = existing {
                return Ok(match record.resolve(&claim.request_hash)? {
                    RecordResolution::Completed { reservation_id } => {
                        ClaimState::Completed(reservation_id)
                    }
                    RecordResolution::InFlight => ClaimState::InFlight,
                });
            }
        }

        Err(Error::internal("idempotency key could be neither claimed nor read")
            .with_phase(Phase::IdempotencyCheck))
    }

    async fn await_in_flight(
        &self,
        claim: &IdempotencyClaim,
    ) -> Result<CreateReservationOutcome, Error> {
        for attempt in 1..=self.config.in_flight_attempts() {
            tokio::time::sleep(self.config.in_flight_interval()).await;
            let record = self
                .ports
                .idempotency
                .get(&claim.key, &claim.user_id, self.now())
                .await
                .map_err(map_idempotency_error)?;
            let Some(record) = record else {
                // Released or expired: the other attempt gave up.
                break;
            };
            match record.resolve(&claim.request_hash)? {
                RecordResolution::Completed { reservation_id } => {
                    debug!(attempt, %reservation_id, "in-flight request completed");
                    return self
                        .replay(reservation_id)
                        .await
                        .map(CreateReservationOutcome::Replayed);
                }
                RecordResolution::InFlight => {}
            }
        }
        debug!("request with this key is still in progress");
        Ok(CreateReservationOutcome::InProgress)
    }

    async fn replay(&self, reservation_id: Uuid) -> Result<ReservationView, Error> {
        self.ports
            .reservations
            .find_by_id(reservation_id)
            .await
            .map_err(map_reservation_read_error)?
            .ok_or_else(|| {
                Error::internal(format!(
                    "completed idempotency record references missing reservation {reservation_id}"
                ))
                .with_phase(Phase::IdempotencyCheck)
            })
    }

    async fn prepare(
        &self,
        requester: &Requester,
        request: &CreateReservationRequest,
        claim: &IdempotencyClaim,
        now: DateTime<Utc>,
    ) -> Result<(ReservationCommit, ReservationView), Error> {
        let resource = self.load_resource(request.resource_id).await?;
        let coupon = self.load_coupon(request.coupon_code.as_deref()).await?;

        let reservation = build_reservation(
            &self.factory,
            &resource,
            coupon.as_ref(),
            requester.user_id(),
            request,
            now,
        )
        .map_err(|err| err.with_phase(Phase::DomainConstruction))?;

        let view = ReservationView::project(&reservation, &resource, coupon.as_ref());
        let response_body_hash = hash_serializable(&view).map_err(|err| {
            Error::internal("failed to hash reservation view")
                .with_phase(Phase::DomainConstruction)
                .with_source(err)
        })?;
        let notification = NotificationJob::reservation_created(
            &ReservationCreatedPayload::new(&reservation, &resource, requester),
            now,
        )
        .map_err(|err| {
            Error::internal("failed to encode notification payload")
                .with_phase(Phase::DomainConstruction)
                .with_source(err)
        })?;
        let completion = IdempotencyCompletion {
            key: claim.key.clone(),
            user_id: claim.user_id.clone(),
            request_hash: claim.request_hash.clone(),
            response_body_hash,
            reservation_id: reservation.id(),
            completed_at: now,
        };

        Ok((
            ReservationCommit {
                reservation,
                notification,
                completion,
            },
            view,
        ))
    }

    async fn load_resource(&self, id: Uuid) -> Result<Resource, Error> {
        self.ports
            .resources
            .find_by_id(id)
            .await
            .map_err(map_resource_error)?
            .ok_or_else(|| Error::resource_not_found(id).with_phase(Phase::DomainConstruction))
    }

    async fn load_coupon(&self, code: Option<&str>) -> Result<Option<Coupon>, Error> {
        let Some(code) = code else {
            return Ok(None);
        };
        self.ports
            .coupons
            .find_by_code(code)
            .await
            .map_err(map_coupon_error)?
            .map(Some)
            .ok_or_else(|| Error::coupon_not_found(code).with_phase(Phase::DomainConstruction))
    }

    async fn release_claim(&self, claim: &IdempotencyClaim) {
        if let Err(err) = self.ports.idempotency.release(claim).await {
            warn!(error = %err, "failed to release idempotency claim");
        }
    }
}

fn build_reservation(
    factory: &ReservationFactory,
    resource: &Resource,
    coupon: Option<&Coupon>,
    user_id: &UserId,
    request: &CreateReservationRequest,
    now: DateTime<Utc>,
) -> Result<crate::domain::reservation::Reservation, Error> {
    let time_slot = TimeSlot::new(request.start_at, request.end_at)?;
    let note = Note::new(&request.note)?;
    let reservation = factory.create(
        ReservationDraft {
            resource,
            user_id: user_id.clone(),
            time_slot,
            coupon,
            note,
        },
        now,
    )?;
    Ok(reservation)
}

#[cfg(test)]
mod tests;
