use parking_core::LedgerError;
use parking_shared::ParkingSpot;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a capacity change does to a lot's spots
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResizePlan {
    /// Numbers for the spots to add
    pub to_create: Vec<i32>,
    /// Available spots to remove, highest number first
    pub to_remove: Vec<Uuid>,
    /// Removals requested but blocked by occupied spots
    pub shortfall: i32,
}

impl ResizePlan {
    /// Grow by adding Available spots after the current highest number; shrink by
    /// removing Available spots only. Occupied spots are never selected, so a
    /// shrink can fall short of `new_capacity`.
    pub fn compute(spots: &[ParkingSpot], new_capacity: i32) -> Result<Self, InventoryError> {
        if new_capacity < 0 {
            return Err(InventoryError::InvalidCapacity(new_capacity));
        }

        let current = spots.len() as i32;
        let mut plan = ResizePlan::default();

        if new_capacity > current {
            let next = spots.iter().map(|s| s.number).max().unwrap_or(0) + 1;
            plan.to_create = (next..next + (new_capacity - current)).collect();
        } else if new_capacity < current {
            let wanted = (current - new_capacity) as usize;
            let mut available: Vec<&ParkingSpot> =
                spots.iter().filter(|s| s.is_available()).collect();
            available.sort_by(|a, b| b.number.cmp(&a.number));

            plan.to_remove = available.into_iter().take(wanted).map(|s| s.id).collect();
            plan.shortfall = (wanted - plan.to_remove.len()) as i32;
        }

        Ok(plan)
    }

    pub fn is_noop(&self) -> bool {
        self.to_create.is_empty() && self.to_remove.is_empty()
    }
}

/// Available spots in allocation order (lowest number first)
pub fn allocation_order(spots: &[ParkingSpot]) -> Vec<&ParkingSpot> {
    let mut available: Vec<&ParkingSpot> = spots.iter().filter(|s| s.is_available()).collect();
    available.sort_by_key(|s| s.number);
    available
}

/// Snapshot of a lot's spot usage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Occupancy {
    pub lot_id: Uuid,
    pub total: i32,
    pub available: i32,
    pub occupied: i32,
}

impl Occupancy {
    pub fn from_spots(lot_id: Uuid, spots: &[ParkingSpot]) -> Self {
        let occupied = spots.iter().filter(|s| s.is_occupied()).count() as i32;
        Self {
            lot_id,
            total: spots.len() as i32,
            available: spots.len() as i32 - occupied,
            occupied,
        }
    }

    /// Occupied share of the lot, 0.0 for an empty lot
    pub fn utilization(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.occupied as f64 / self.total as f64
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum InventoryError {
    #[error("Capacity must not be negative, got {0}")]
    InvalidCapacity(i32),
}

impl From<InventoryError> for LedgerError {
    fn from(err: InventoryError) -> Self {
        LedgerError::Validation(err.to_string())
    }
}
