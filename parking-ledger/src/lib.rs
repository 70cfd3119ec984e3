pub mod accounts;
pub mod ledger;
pub mod lots;
pub mod models;
pub mod summary;

pub use accounts::AccountService;
pub use ledger::ReservationLedger;
pub use models::{LotUsage, ResizeOutcome, SpotDetails};

#[cfg(test)]
mod test_support;
