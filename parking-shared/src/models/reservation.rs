use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A vehicle's stay in a spot. Open until `ended_at` is recorded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reservation {
    pub id: Uuid,
    pub spot_id: Uuid,
    /// Denormalized from the spot; spots never move between lots
    pub lot_id: Uuid,
    pub user_id: Uuid,
    pub vehicle_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub total_cost: Option<f64>,
}

impl Reservation {
    pub fn open(
        spot_id: Uuid,
        lot_id: Uuid,
        user_id: Uuid,
        vehicle_id: String,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            spot_id,
            lot_id,
            user_id,
            vehicle_id,
            started_at,
            ended_at: None,
            total_cost: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }

    pub fn close(&mut self, ended_at: DateTime<Utc>, total_cost: f64) {
        self.ended_at = Some(ended_at);
        self.total_cost = Some(total_cost);
    }
}
