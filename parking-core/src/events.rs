use async_trait::async_trait;
use parking_shared::models::events::LedgerEvent;

use crate::RepoError;

/// Destination for ledger events once a state change is stored
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, event: &LedgerEvent) -> Result<(), RepoError>;
}

/// Discards everything. For callers that do not consume events.
pub struct NoopEventSink;

#[async_trait]
impl EventSink for NoopEventSink {
    async fn publish(&self, _event: &LedgerEvent) -> Result<(), RepoError> {
        Ok(())
    }
}
