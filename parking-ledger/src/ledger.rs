use parking_catalog::{allocation_order, PricingEngine};
use parking_core::{
    EventSink, LedgerError, LedgerResult, Repositories, RequestContext,
};
use parking_shared::models::events::{
    LedgerEvent, ReservationClosedEvent, ReservationOpenedEvent,
};
use parking_shared::{ParkingLot, Reservation, SpotStatus};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Longest vehicle identifier the ledger accepts
pub const MAX_VEHICLE_ID_LEN: usize = 20;

/// Allocates spots, opens and closes reservations, and bills elapsed time.
///
/// Every operation takes a [`RequestContext`] naming the caller and the
/// current instant; the ledger holds no session state of its own.
///
/// Allocation claims a spot with a conditional status transition, so two
/// callers racing for the same spot cannot both win it. The duplicate-vehicle
/// check is still a plain read before the write.
#[derive(Clone)]
pub struct ReservationLedger {
    pub(crate) repos: Repositories,
    pub(crate) events: Arc<dyn EventSink>,
    pub(crate) pricing: PricingEngine,
}

impl ReservationLedger {
    pub fn new(repos: Repositories, events: Arc<dyn EventSink>) -> Self {
        Self {
            repos,
            events,
            pricing: PricingEngine::default(),
        }
    }

    pub fn with_pricing(mut self, pricing: PricingEngine) -> Self {
        self.pricing = pricing;
        self
    }

    /// Reserve the lowest-numbered Available spot in `lot_id` for `vehicle_id`.
    pub async fn allocate(
        &self,
        ctx: &RequestContext,
        lot_id: Uuid,
        vehicle_id: &str,
    ) -> LedgerResult<Reservation> {
        ctx.require_user()?;
        let vehicle_id = normalize_vehicle_id(vehicle_id)?;
        let lot = self.load_lot(lot_id).await?;

        let spots = self.repos.spots.list_spots(lot.id).await?;
        let candidates = allocation_order(&spots);
        if candidates.is_empty() {
            return Err(LedgerError::NoAvailableSpot(lot.id));
        }

        if self
            .repos
            .reservations
            .find_open_by_vehicle(&vehicle_id)
            .await?
            .is_some()
        {
            return Err(LedgerError::DuplicateActiveVehicle(vehicle_id));
        }

        for spot in candidates {
            let claimed = self
                .repos
                .spots
                .transition_status(spot.id, SpotStatus::Available, SpotStatus::Occupied)
                .await?;
            if !claimed {
                warn!("Spot {} in lot {} was taken concurrently, trying next", spot.number, lot.id);
                continue;
            }

            let reservation = Reservation::open(
                spot.id,
                lot.id,
                ctx.actor.user_id,
                vehicle_id.clone(),
                ctx.now,
            );

            if let Err(e) = self.repos.reservations.insert_reservation(&reservation).await {
                // Hand the spot back so a failed write does not strand it
                if let Err(rollback) = self
                    .repos
                    .spots
                    .transition_status(spot.id, SpotStatus::Occupied, SpotStatus::Available)
                    .await
                {
                    error!("Failed to release spot {} after insert error: {}", spot.id, rollback);
                }
                // A concurrent allocation for the same vehicle won the unique open-vehicle slot
                if self
                    .repos
                    .reservations
                    .find_open_by_vehicle(&vehicle_id)
                    .await?
                    .is_some()
                {
                    return Err(LedgerError::DuplicateActiveVehicle(vehicle_id));
                }
                return Err(e.into());
            }

            info!(
                "Reservation {} opened: lot {} spot {} vehicle {}",
                reservation.id, lot.id, spot.number, reservation.vehicle_id
            );
            self.emit(LedgerEvent::ReservationOpened(ReservationOpenedEvent {
                reservation_id: reservation.id,
                lot_id: lot.id,
                spot_id: spot.id,
                user_id: reservation.user_id,
                vehicle_id: reservation.vehicle_id.clone(),
                timestamp: ctx.now.timestamp(),
            }))
            .await;

            return Ok(reservation);
        }

        Err(LedgerError::NoAvailableSpot(lot.id))
    }

    /// Close a reservation at `ctx.now`, bill it, and free its spot.
    pub async fn release(
        &self,
        ctx: &RequestContext,
        reservation_id: Uuid,
    ) -> LedgerResult<Reservation> {
        let mut reservation = self.load_reservation(reservation_id).await?;

        if !reservation.is_open() {
            return Err(LedgerError::AlreadyReleased(reservation.id));
        }
        if reservation.user_id != ctx.actor.user_id {
            return Err(LedgerError::Unauthorized(format!(
                "reservation {} belongs to another user",
                reservation.id
            )));
        }

        let lot = self.load_lot(reservation.lot_id).await?;
        let cost = self
            .pricing
            .cost(lot.hourly_rate, reservation.started_at, ctx.now)?;

        reservation.close(ctx.now, cost);
        if !self.repos.reservations.close_reservation(&reservation).await? {
            warn!("Reservation {} was released concurrently", reservation.id);
            return Err(LedgerError::AlreadyReleased(reservation.id));
        }

        let freed = self
            .repos
            .spots
            .transition_status(reservation.spot_id, SpotStatus::Occupied, SpotStatus::Available)
            .await?;
        if !freed {
            warn!(
                "Spot {} was not occupied when reservation {} closed",
                reservation.spot_id, reservation.id
            );
        }

        info!(
            "Reservation {} closed: lot {} cost {:.2}",
            reservation.id, lot.id, cost
        );
        self.emit(LedgerEvent::ReservationClosed(ReservationClosedEvent {
            reservation_id: reservation.id,
            lot_id: lot.id,
            spot_id: reservation.spot_id,
            total_cost: cost,
            timestamp: ctx.now.timestamp(),
        }))
        .await;

        Ok(reservation)
    }

    /// What `release` would charge at `ctx.now`. Closed reservations report their billed cost.
    pub async fn estimate_cost(
        &self,
        ctx: &RequestContext,
        reservation_id: Uuid,
    ) -> LedgerResult<f64> {
        let reservation = self.load_reservation(reservation_id).await?;
        if reservation.user_id != ctx.actor.user_id {
            return Err(LedgerError::Unauthorized(format!(
                "reservation {} belongs to another user",
                reservation.id
            )));
        }

        if let Some(cost) = reservation.total_cost {
            return Ok(cost);
        }

        let lot = self.load_lot(reservation.lot_id).await?;
        Ok(self
            .pricing
            .cost(lot.hourly_rate, reservation.started_at, ctx.now)?)
    }

    /// The caller's reservations that have not been released yet
    pub async fn open_reservations(&self, ctx: &RequestContext) -> LedgerResult<Vec<Reservation>> {
        Ok(self
            .repos
            .reservations
            .list_open_by_user(ctx.actor.user_id)
            .await?)
    }

    pub(crate) async fn load_lot(&self, lot_id: Uuid) -> LedgerResult<ParkingLot> {
        self.repos
            .lots
            .get_lot(lot_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Parking lot", lot_id))
    }

    pub(crate) async fn load_reservation(&self, reservation_id: Uuid) -> LedgerResult<Reservation> {
        self.repos
            .reservations
            .get_reservation(reservation_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Reservation", reservation_id))
    }

    /// Publish after the state change is stored. Delivery failures are logged, not returned.
    pub(crate) async fn emit(&self, event: LedgerEvent) {
        if let Err(e) = self.events.publish(&event).await {
            warn!("Failed to publish {} event: {}", event.topic(), e);
        }
    }
}

fn normalize_vehicle_id(raw: &str) -> LedgerResult<String> {
    let vehicle_id = raw.trim();
    if vehicle_id.is_empty() {
        return Err(LedgerError::Validation(
            "vehicle identifier must not be empty".to_string(),
        ));
    }
    if vehicle_id.chars().count() > MAX_VEHICLE_ID_LEN {
        return Err(LedgerError::Validation(format!(
            "vehicle identifier longer than {} characters",
            MAX_VEHICLE_ID_LEN
        )));
    }
    Ok(vehicle_id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{admin_ctx, fixture, user_ctx};
    use chrono::Duration;

    #[tokio::test]
    async fn test_allocate_takes_first_available_spot() {
        let fx = fixture(3).await;
        let ctx = user_ctx(fx.alice);

        let reservation = fx.ledger.allocate(&ctx, fx.lot.id, " KA01AB1234 ").await.unwrap();
        assert_eq!(reservation.vehicle_id, "KA01AB1234");
        assert_eq!(reservation.started_at, ctx.now);
        assert!(reservation.is_open());

        let spots = fx.spots(fx.lot.id).await;
        assert_eq!(spots[0].id, reservation.spot_id);
        assert_eq!(spots[0].status, SpotStatus::Occupied);
        assert!(spots[1..].iter().all(|s| s.is_available()));

        let second = fx.ledger.allocate(&ctx, fx.lot.id, "KA01AB9999").await.unwrap();
        assert_eq!(second.spot_id, spots[1].id);
    }

    #[tokio::test]
    async fn test_allocate_full_lot_fails() {
        let fx = fixture(1).await;
        fx.ledger
            .allocate(&user_ctx(fx.alice), fx.lot.id, "CAR-1")
            .await
            .unwrap();

        let err = fx
            .ledger
            .allocate(&user_ctx(fx.bob), fx.lot.id, "CAR-2")
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NoAvailableSpot(id) if id == fx.lot.id));
    }

    #[tokio::test]
    async fn test_allocate_empty_lot_fails() {
        let fx = fixture(0).await;
        let err = fx
            .ledger
            .allocate(&user_ctx(fx.alice), fx.lot.id, "CAR-1")
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NoAvailableSpot(_)));
    }

    #[tokio::test]
    async fn test_vehicle_cannot_hold_two_open_reservations() {
        let fx = fixture(3).await;
        let first = fx
            .ledger
            .allocate(&user_ctx(fx.alice), fx.lot.id, "MH12XY0001")
            .await
            .unwrap();

        // Same plate, different user, same lot
        let err = fx
            .ledger
            .allocate(&user_ctx(fx.bob), fx.lot.id, "MH12XY0001")
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateActiveVehicle(ref v) if v == "MH12XY0001"));

        // Rejected allocation must not consume a spot
        let occupied = fx
            .spots(fx.lot.id)
            .await
            .into_iter()
            .filter(|s| s.is_occupied())
            .count();
        assert_eq!(occupied, 1);

        fx.ledger.release(&user_ctx(fx.alice), first.id).await.unwrap();
        fx.ledger
            .allocate(&user_ctx(fx.bob), fx.lot.id, "MH12XY0001")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_admin_cannot_reserve() {
        let fx = fixture(2).await;
        let err = fx
            .ledger
            .allocate(&admin_ctx(fx.admin), fx.lot.id, "ADMIN-CAR")
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_allocate_validates_vehicle_and_lot() {
        let fx = fixture(2).await;
        let ctx = user_ctx(fx.alice);

        let err = fx.ledger.allocate(&ctx, fx.lot.id, "   ").await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));

        let err = fx
            .ledger
            .allocate(&ctx, fx.lot.id, "ABCDEFGHIJKLMNOPQRSTUVWXYZ")
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));

        let err = fx.ledger.allocate(&ctx, Uuid::new_v4(), "CAR-1").await.unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_release_bills_elapsed_time() {
        let fx = fixture(2).await;
        let opened = user_ctx(fx.alice);
        let reservation = fx.ledger.allocate(&opened, fx.lot.id, "CAR-1").await.unwrap();

        let later = RequestContext::at(opened.actor, opened.now + Duration::hours(2));
        let closed = fx.ledger.release(&later, reservation.id).await.unwrap();

        assert_eq!(closed.ended_at, Some(later.now));
        assert_eq!(closed.total_cost, Some(20.0));

        let spot = fx.spots(fx.lot.id).await.remove(0);
        assert!(spot.is_available());

        let stored = fx.reservation(reservation.id).await;
        assert_eq!(stored.total_cost, Some(20.0));
    }

    #[tokio::test]
    async fn test_release_twice_fails() {
        let fx = fixture(1).await;
        let ctx = user_ctx(fx.alice);
        let reservation = fx.ledger.allocate(&ctx, fx.lot.id, "CAR-1").await.unwrap();

        fx.ledger.release(&ctx, reservation.id).await.unwrap();
        let err = fx.ledger.release(&ctx, reservation.id).await.unwrap_err();
        assert!(matches!(err, LedgerError::AlreadyReleased(id) if id == reservation.id));
    }

    #[tokio::test]
    async fn test_only_owner_can_release() {
        let fx = fixture(1).await;
        let reservation = fx
            .ledger
            .allocate(&user_ctx(fx.alice), fx.lot.id, "CAR-1")
            .await
            .unwrap();

        let err = fx
            .ledger
            .release(&user_ctx(fx.bob), reservation.id)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized(_)));

        // Still open and still holding the spot
        assert!(fx.reservation(reservation.id).await.is_open());
        assert!(fx.spots(fx.lot.id).await[0].is_occupied());
    }

    #[tokio::test]
    async fn test_estimate_cost_does_not_close() {
        let fx = fixture(1).await;
        let opened = user_ctx(fx.alice);
        let reservation = fx.ledger.allocate(&opened, fx.lot.id, "CAR-1").await.unwrap();

        let later = RequestContext::at(opened.actor, opened.now + Duration::minutes(90));
        let estimate = fx.ledger.estimate_cost(&later, reservation.id).await.unwrap();
        assert_eq!(estimate, 15.0);
        assert!(fx.reservation(reservation.id).await.is_open());

        let err = fx
            .ledger
            .estimate_cost(&user_ctx(fx.bob), reservation.id)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized(_)));
        let err = fx
            .ledger
            .estimate_cost(&admin_ctx(fx.admin), reservation.id)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized(_)));

        let closed = fx.ledger.release(&later, reservation.id).await.unwrap();
        let much_later = RequestContext::at(opened.actor, later.now + Duration::hours(5));
        let billed = fx.ledger.estimate_cost(&much_later, closed.id).await.unwrap();
        assert_eq!(billed, 15.0);
    }

    #[tokio::test]
    async fn test_open_reservations_lists_callers_only() {
        let fx = fixture(3).await;
        let alice = user_ctx(fx.alice);
        let first = fx.ledger.allocate(&alice, fx.lot.id, "CAR-1").await.unwrap();
        fx.ledger.allocate(&alice, fx.lot.id, "CAR-2").await.unwrap();
        fx.ledger
            .allocate(&user_ctx(fx.bob), fx.lot.id, "CAR-3")
            .await
            .unwrap();
        fx.ledger.release(&alice, first.id).await.unwrap();

        let open = fx.ledger.open_reservations(&alice).await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].vehicle_id, "CAR-2");
    }

    #[tokio::test]
    async fn test_events_follow_reservation_lifecycle() {
        let fx = fixture(1).await;
        let mut rx = fx.events.subscribe();
        let ctx = user_ctx(fx.alice);

        let reservation = fx.ledger.allocate(&ctx, fx.lot.id, "CAR-1").await.unwrap();
        fx.ledger.release(&ctx, reservation.id).await.unwrap();

        match rx.recv().await.unwrap() {
            LedgerEvent::ReservationOpened(e) => assert_eq!(e.reservation_id, reservation.id),
            other => panic!("unexpected event {:?}", other),
        }
        match rx.recv().await.unwrap() {
            LedgerEvent::ReservationClosed(e) => assert_eq!(e.total_cost, 0.0),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_racing_releases_bill_once() {
        let fx = fixture(1).await;
        let ctx = user_ctx(fx.alice);
        let reservation = fx.ledger.allocate(&ctx, fx.lot.id, "CAR-1").await.unwrap();
        let later = RequestContext::at(ctx.actor, ctx.now + Duration::hours(1));

        let (a, b) = tokio::join!(
            fx.ledger.release(&later, reservation.id),
            fx.ledger.release(&later, reservation.id)
        );

        let outcomes = [a, b];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes
            .iter()
            .any(|r| matches!(r, Err(LedgerError::AlreadyReleased(id)) if *id == reservation.id)));
        assert_eq!(fx.reservation(reservation.id).await.total_cost, Some(10.0));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_racing_allocations_for_one_vehicle() {
        let fx = fixture(2).await;
        let (alice, bob) = (fx.ledger.clone(), fx.ledger.clone());
        let lot_id = fx.lot.id;
        let (alice_ctx, bob_ctx) = (user_ctx(fx.alice), user_ctx(fx.bob));

        let first = tokio::spawn(async move { alice.allocate(&alice_ctx, lot_id, "CAR-1").await });
        let second = tokio::spawn(async move { bob.allocate(&bob_ctx, lot_id, "CAR-1").await });
        let outcomes = [first.await.unwrap(), second.await.unwrap()];

        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes
            .iter()
            .any(|r| matches!(r, Err(LedgerError::DuplicateActiveVehicle(v)) if v == "CAR-1")));
        // The losing claim handed its spot back
        let occupied = fx.spots(fx.lot.id).await.iter().filter(|s| s.is_occupied()).count();
        assert_eq!(occupied, 1);
    }
}
