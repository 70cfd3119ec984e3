use parking_catalog::Occupancy;
use parking_shared::User;
use parking_store::app_config::BootstrapConfig;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod state;

pub use state::AppState;

const DEFAULT_LOG_FILTER: &str = "parking_app=debug,parking_ledger=debug,parking_store=info";

pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// What a start-up pass did and found
#[derive(Debug, Serialize)]
pub struct BootstrapReport {
    pub admin: User,
    pub admin_created: bool,
    pub lots: Vec<Occupancy>,
}

/// Seed the administrator account, then take a snapshot of every lot.
pub async fn bootstrap(state: &AppState, config: &BootstrapConfig) -> anyhow::Result<BootstrapReport> {
    let (admin, admin_created) = state
        .accounts
        .ensure_default_admin(
            &config.admin_email,
            config.admin_password.expose(),
            &config.admin_name,
        )
        .await?;

    let mut lots = Vec::new();
    for lot in state.ledger.list_lots().await? {
        let occupancy = state.ledger.lot_occupancy(lot.id).await?;
        info!(
            "Lot {} ({}): {}/{} spots occupied",
            lot.id, lot.location, occupancy.occupied, occupancy.total
        );
        lots.push(occupancy);
    }

    Ok(BootstrapReport {
        admin,
        admin_created,
        lots,
    })
}
