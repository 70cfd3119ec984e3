use parking_shared::{ParkingLot, ParkingSpot, Reservation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Result of changing a lot's capacity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResizeOutcome {
    /// The lot after the resize; `capacity` equals the spots it now has
    pub lot: ParkingLot,
    pub previous_spots: i32,
    pub created: i32,
    pub removed: i32,
    /// Removals that were skipped because the spots were occupied
    pub shortfall: i32,
}

/// Admin view of one spot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpotDetails {
    pub spot: ParkingSpot,
    pub open_reservation: Option<Reservation>,
}

/// How often a user parked in a lot, and what it cost them
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LotUsage {
    pub lot_id: Uuid,
    pub location: Option<String>,
    pub reservations: usize,
    pub total_spent: f64,
}
