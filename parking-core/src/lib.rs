pub mod context;
pub mod events;
pub mod identity;
pub mod repository;

pub use context::{Actor, RequestContext};
pub use events::EventSink;
pub use repository::{
    LotRepository, RepoError, RepoResult, Repositories, ReservationRepository, SpotRepository,
    UserRepository,
};

use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("No available spot in lot {0}")]
    NoAvailableSpot(Uuid),
    #[error("Vehicle {0} already has an active reservation")]
    DuplicateActiveVehicle(String),
    #[error("Reservation already released: {0}")]
    AlreadyReleased(Uuid),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Lot {0} has occupied spots and cannot be deleted")]
    LotOccupiedCannotDelete(Uuid),
    #[error("Spot {0} is occupied")]
    SpotOccupied(Uuid),
    #[error("Email already registered: {0}")]
    DuplicateEmail(String),
    #[error("Credential processing failed: {0}")]
    Credentials(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Storage failure: {0}")]
    Storage(#[from] RepoError),
}

impl LedgerError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
