use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A physical parking location with a fixed number of spots
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParkingLot {
    pub id: Uuid,
    pub location: String,
    pub address: String,
    pub postal_code: String,
    /// Charged per hour of occupancy, pro rata
    pub hourly_rate: f64,
    pub capacity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ParkingLot {
    pub fn new(draft: LotDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            location: draft.location,
            address: draft.address,
            postal_code: draft.postal_code,
            hourly_rate: draft.hourly_rate,
            capacity: draft.capacity,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the descriptive fields and rate. Capacity is owned by the resize flow.
    pub fn apply_details(&mut self, draft: &LotDraft, now: DateTime<Utc>) {
        self.location = draft.location.clone();
        self.address = draft.address.clone();
        self.postal_code = draft.postal_code.clone();
        self.hourly_rate = draft.hourly_rate;
        self.updated_at = now;
    }

    /// Case-insensitive match on location or postal code.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.location.to_lowercase().contains(&needle)
            || self.postal_code.to_lowercase().contains(&needle)
    }
}

/// Admin input for creating or editing a lot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LotDraft {
    pub location: String,
    pub address: String,
    pub postal_code: String,
    pub hourly_rate: f64,
    pub capacity: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> LotDraft {
        LotDraft {
            location: "Central Station".to_string(),
            address: "1 Station Road".to_string(),
            postal_code: "560001".to_string(),
            hourly_rate: 10.0,
            capacity: 4,
        }
    }

    #[test]
    fn test_matches_location_and_postal_code() {
        let lot = ParkingLot::new(draft(), Utc::now());

        assert!(lot.matches("central"));
        assert!(lot.matches("STATION"));
        assert!(lot.matches("5600"));
        assert!(!lot.matches("airport"));
    }

    #[test]
    fn test_apply_details_keeps_capacity() {
        let created = Utc::now();
        let mut lot = ParkingLot::new(draft(), created);
        let mut edit = draft();
        edit.hourly_rate = 12.5;
        edit.capacity = 40;

        let edited = created + chrono::Duration::minutes(5);
        lot.apply_details(&edit, edited);

        assert_eq!(lot.hourly_rate, 12.5);
        assert_eq!(lot.capacity, 4);
        assert_eq!(lot.created_at, created);
        assert_eq!(lot.updated_at, edited);
    }
}
