use async_trait::async_trait;
use parking_shared::{ParkingLot, ParkingSpot, Reservation, SpotStatus, User};
use std::sync::Arc;
use uuid::Uuid;

pub type RepoError = Box<dyn std::error::Error + Send + Sync>;
pub type RepoResult<T> = Result<T, RepoError>;

/// Repository trait for parking lot records
#[async_trait]
pub trait LotRepository: Send + Sync {
    async fn insert_lot(&self, lot: &ParkingLot) -> RepoResult<()>;

    async fn get_lot(&self, id: Uuid) -> RepoResult<Option<ParkingLot>>;

    async fn list_lots(&self) -> RepoResult<Vec<ParkingLot>>;

    /// Case-insensitive substring match on location or postal code
    async fn search_lots(&self, needle: &str) -> RepoResult<Vec<ParkingLot>>;

    async fn update_lot(&self, lot: &ParkingLot) -> RepoResult<()>;

    async fn delete_lot(&self, id: Uuid) -> RepoResult<()>;
}

/// Repository trait for the spots of a lot
#[async_trait]
pub trait SpotRepository: Send + Sync {
    async fn insert_spots(&self, spots: &[ParkingSpot]) -> RepoResult<()>;

    async fn get_spot(&self, id: Uuid) -> RepoResult<Option<ParkingSpot>>;

    /// Spots of a lot ordered by spot number
    async fn list_spots(&self, lot_id: Uuid) -> RepoResult<Vec<ParkingSpot>>;

    /// Move a spot from `from` to `to`. Returns false when the spot was not in `from`.
    async fn transition_status(
        &self,
        spot_id: Uuid,
        from: SpotStatus,
        to: SpotStatus,
    ) -> RepoResult<bool>;

    /// Returns the number of spots removed
    async fn delete_spots(&self, ids: &[Uuid]) -> RepoResult<u64>;
}

/// Repository trait for reservation history
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    async fn insert_reservation(&self, reservation: &Reservation) -> RepoResult<()>;

    async fn get_reservation(&self, id: Uuid) -> RepoResult<Option<Reservation>>;

    /// Persist `ended_at` and `total_cost` if the stored row is still open.
    /// Returns false when another caller closed it first.
    async fn close_reservation(&self, reservation: &Reservation) -> RepoResult<bool>;

    async fn find_open_by_vehicle(&self, vehicle_id: &str) -> RepoResult<Option<Reservation>>;

    async fn find_open_by_spot(&self, spot_id: Uuid) -> RepoResult<Option<Reservation>>;

    async fn list_open_by_user(&self, user_id: Uuid) -> RepoResult<Vec<Reservation>>;

    async fn list_by_user(&self, user_id: Uuid) -> RepoResult<Vec<Reservation>>;

    /// Drop the history of the given spots. Returns the number of reservations removed.
    async fn delete_by_spots(&self, spot_ids: &[Uuid]) -> RepoResult<u64>;
}

/// Repository trait for accounts
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert_user(&self, user: &User) -> RepoResult<()>;

    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>>;

    /// `email` is expected in normalized (lower-case) form
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;

    async fn update_user(&self, user: &User) -> RepoResult<()>;

    async fn list_users(&self) -> RepoResult<Vec<User>>;
}

/// The full set of ports the ledger reads and writes through
#[derive(Clone)]
pub struct Repositories {
    pub lots: Arc<dyn LotRepository>,
    pub spots: Arc<dyn SpotRepository>,
    pub reservations: Arc<dyn ReservationRepository>,
    pub users: Arc<dyn UserRepository>,
}
