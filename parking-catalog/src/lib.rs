pub mod inventory;
pub mod lot;
pub mod pricing;

pub use inventory::{allocation_order, InventoryError, Occupancy, ResizePlan};
pub use lot::{validate_draft, LotError};
pub use pricing::{PricingEngine, PricingError};
