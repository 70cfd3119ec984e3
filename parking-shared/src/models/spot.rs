use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpotStatus {
    Available,
    Occupied,
}

impl SpotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpotStatus::Available => "AVAILABLE",
            SpotStatus::Occupied => "OCCUPIED",
        }
    }
}

impl fmt::Display for SpotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpotStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AVAILABLE" => Ok(SpotStatus::Available),
            "OCCUPIED" => Ok(SpotStatus::Occupied),
            other => Err(format!("Unknown spot status: {}", other)),
        }
    }
}

/// One allocatable unit within a lot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParkingSpot {
    pub id: Uuid,
    pub lot_id: Uuid,
    /// 1-based position within the lot
    pub number: i32,
    pub status: SpotStatus,
    pub created_at: DateTime<Utc>,
}

impl ParkingSpot {
    pub fn new(lot_id: Uuid, number: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            lot_id,
            number,
            status: SpotStatus::Available,
            created_at: Utc::now(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == SpotStatus::Available
    }

    pub fn is_occupied(&self) -> bool {
        self.status == SpotStatus::Occupied
    }
}
