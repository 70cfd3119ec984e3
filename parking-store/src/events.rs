use async_trait::async_trait;
use parking_core::{EventSink, RepoError};
use parking_shared::models::events::LedgerEvent;
use tokio::sync::broadcast;
use tracing::info;

/// Writes each event to the log as JSON
pub struct TracingEventSink;

#[async_trait]
impl EventSink for TracingEventSink {
    async fn publish(&self, event: &LedgerEvent) -> Result<(), RepoError> {
        let payload = serde_json::to_string(event)?;
        info!("Event {}/{}: {}", event.topic(), event.key(), payload);
        Ok(())
    }
}

/// Fans events out to in-process subscribers
#[derive(Clone)]
pub struct BroadcastEventSink {
    tx: broadcast::Sender<LedgerEvent>,
}

impl BroadcastEventSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.tx.subscribe()
    }
}

#[async_trait]
impl EventSink for BroadcastEventSink {
    async fn publish(&self, event: &LedgerEvent) -> Result<(), RepoError> {
        // No subscribers is not a failure
        let _ = self.tx.send(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_shared::models::events::LotDeletedEvent;
    use uuid::Uuid;

    fn event() -> LedgerEvent {
        LedgerEvent::LotDeleted(LotDeletedEvent {
            lot_id: Uuid::new_v4(),
            spots_removed: 2,
            timestamp: 0,
        })
    }

    #[tokio::test]
    async fn test_broadcast_reaches_subscribers() {
        let sink = BroadcastEventSink::new(8);
        sink.publish(&event()).await.unwrap();

        let mut rx = sink.subscribe();
        let sent = event();
        sink.publish(&sent).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), sent);
    }

    #[tokio::test]
    async fn test_tracing_sink_accepts_events() {
        assert!(TracingEventSink.publish(&event()).await.is_ok());
    }
}
