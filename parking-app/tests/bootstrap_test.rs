use parking_app::{bootstrap, AppState};
use parking_catalog::PricingEngine;
use parking_core::events::NoopEventSink;
use parking_core::{Actor, RequestContext};
use parking_shared::{LotDraft, Masked};
use parking_store::app_config::BootstrapConfig;
use parking_store::InMemoryStore;
use std::sync::Arc;
use uuid::Uuid;

fn state() -> AppState {
    let store = Arc::new(InMemoryStore::default());
    AppState::new(
        InMemoryStore::repositories(&store),
        Arc::new(NoopEventSink),
        PricingEngine::default(),
    )
}

fn config() -> BootstrapConfig {
    BootstrapConfig {
        admin_email: "Admin@Example.com".to_string(),
        admin_password: Masked::new("admin123".to_string()),
        admin_name: "Admin".to_string(),
    }
}

#[tokio::test]
async fn test_bootstrap_seeds_admin_once() {
    let state = state();

    let first = bootstrap(&state, &config()).await.unwrap();
    assert!(first.admin_created);
    assert!(first.admin.is_admin);
    assert_eq!(first.admin.email, "admin@example.com");
    assert!(first.lots.is_empty());

    let second = bootstrap(&state, &config()).await.unwrap();
    assert!(!second.admin_created);
    assert_eq!(second.admin.id, first.admin.id);

    let user = state
        .accounts
        .authenticate("admin@example.com", "admin123")
        .await
        .unwrap();
    assert_eq!(user.id, first.admin.id);
}

#[tokio::test]
async fn test_bootstrap_reports_occupancy() {
    let state = state();
    let report = bootstrap(&state, &config()).await.unwrap();
    let admin = RequestContext::new(Actor::from(&report.admin));

    let lot = state
        .ledger
        .create_lot(
            &admin,
            LotDraft {
                location: "Airport".to_string(),
                address: "Terminal 1".to_string(),
                postal_code: "560300".to_string(),
                hourly_rate: 40.0,
                capacity: 3,
            },
        )
        .await
        .unwrap();

    let driver = RequestContext::new(Actor::user(Uuid::new_v4()));
    state.ledger.allocate(&driver, lot.id, "KA01AB1234").await.unwrap();

    let report = bootstrap(&state, &config()).await.unwrap();
    assert_eq!(report.lots.len(), 1);
    assert_eq!(report.lots[0].lot_id, lot.id);
    assert_eq!(report.lots[0].total, 3);
    assert_eq!(report.lots[0].occupied, 1);
}
