use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct ReservationOpenedEvent {
    pub reservation_id: Uuid,
    pub lot_id: Uuid,
    pub spot_id: Uuid,
    pub user_id: Uuid,
    pub vehicle_id: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct ReservationClosedEvent {
    pub reservation_id: Uuid,
    pub lot_id: Uuid,
    pub spot_id: Uuid,
    pub total_cost: f64,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct LotResizedEvent {
    pub lot_id: Uuid,
    pub previous_spots: i32,
    pub current_spots: i32,
    /// Spots that could not be removed because they were occupied
    pub shortfall: i32,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct LotDeletedEvent {
    pub lot_id: Uuid,
    pub spots_removed: i32,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    ReservationOpened(ReservationOpenedEvent),
    ReservationClosed(ReservationClosedEvent),
    LotResized(LotResizedEvent),
    LotDeleted(LotDeletedEvent),
}

impl LedgerEvent {
    pub fn topic(&self) -> &'static str {
        match self {
            LedgerEvent::ReservationOpened(_) => "reservations.opened",
            LedgerEvent::ReservationClosed(_) => "reservations.closed",
            LedgerEvent::LotResized(_) => "lots.resized",
            LedgerEvent::LotDeleted(_) => "lots.deleted",
        }
    }

    /// Partition key: events about the same lot stay ordered
    pub fn key(&self) -> Uuid {
        match self {
            LedgerEvent::ReservationOpened(e) => e.lot_id,
            LedgerEvent::ReservationClosed(e) => e.lot_id,
            LedgerEvent::LotResized(e) => e.lot_id,
            LedgerEvent::LotDeleted(e) => e.lot_id,
        }
    }
}
