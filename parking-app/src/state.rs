use parking_catalog::PricingEngine;
use parking_core::{EventSink, Repositories};
use parking_ledger::{AccountService, ReservationLedger};
use std::sync::Arc;

/// Services shared by everything the binary drives
#[derive(Clone)]
pub struct AppState {
    pub ledger: ReservationLedger,
    pub accounts: AccountService,
}

impl AppState {
    pub fn new(repos: Repositories, events: Arc<dyn EventSink>, pricing: PricingEngine) -> Self {
        Self {
            accounts: AccountService::new(repos.users.clone()),
            ledger: ReservationLedger::new(repos, events).with_pricing(pricing),
        }
    }
}
