use chrono::{DateTime, TimeZone, Utc};
use parking_core::{Actor, RequestContext, ReservationRepository, SpotRepository};
use parking_shared::{LotDraft, ParkingLot, ParkingSpot, Reservation};
use parking_store::{BroadcastEventSink, InMemoryStore};
use std::sync::Arc;
use uuid::Uuid;

use crate::ReservationLedger;

pub struct Fixture {
    pub store: Arc<InMemoryStore>,
    pub events: Arc<BroadcastEventSink>,
    pub ledger: ReservationLedger,
    pub lot: ParkingLot,
    pub admin: Uuid,
    pub alice: Uuid,
    pub bob: Uuid,
}

impl Fixture {
    pub async fn spots(&self, lot_id: Uuid) -> Vec<ParkingSpot> {
        self.store.list_spots(lot_id).await.unwrap()
    }

    pub async fn reservation(&self, id: Uuid) -> Reservation {
        self.store.get_reservation(id).await.unwrap().unwrap()
    }
}

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
}

pub fn user_ctx(user_id: Uuid) -> RequestContext {
    RequestContext::at(Actor::user(user_id), now())
}

pub fn admin_ctx(user_id: Uuid) -> RequestContext {
    RequestContext::at(Actor::admin(user_id), now())
}

pub fn draft(capacity: i32) -> LotDraft {
    LotDraft {
        location: "Central Station".to_string(),
        address: "1 Station Road".to_string(),
        postal_code: "560001".to_string(),
        hourly_rate: 10.0,
        capacity,
    }
}

/// A ledger over an empty in-memory store with one lot of `capacity` spots at 10.0/h.
pub async fn fixture(capacity: i32) -> Fixture {
    let store = Arc::new(InMemoryStore::default());
    let events = Arc::new(BroadcastEventSink::new(64));
    let ledger = ReservationLedger::new(InMemoryStore::repositories(&store), events.clone());

    let admin = Uuid::new_v4();
    let lot = ledger.create_lot(&admin_ctx(admin), draft(capacity)).await.unwrap();

    Fixture {
        store,
        events,
        ledger,
        lot,
        admin,
        alice: Uuid::new_v4(),
        bob: Uuid::new_v4(),
    }
}
