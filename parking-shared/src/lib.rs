pub mod models;
pub mod pii;

pub use models::lot::{LotDraft, ParkingLot};
pub use models::reservation::Reservation;
pub use models::spot::{ParkingSpot, SpotStatus};
pub use models::user::{ProfileUpdate, User, UserDraft};
pub use pii::Masked;
