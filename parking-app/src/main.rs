use anyhow::Context;
use parking_app::{bootstrap, init_tracing, AppState};
use parking_catalog::PricingEngine;
use parking_store::{app_config::Config, DbClient, PgStore, TracingEventSink};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting parking ledger");

    let db = DbClient::new(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to connect to Postgres")?;
    db.migrate().await.context("Failed to run migrations")?;

    let store = Arc::new(PgStore::new(db.pool.clone()));
    let state = AppState::new(
        PgStore::repositories(&store),
        Arc::new(TracingEventSink),
        PricingEngine::new(config.pricing.clone()),
    );

    let report = bootstrap(&state, &config.bootstrap).await?;
    if report.admin_created {
        tracing::info!("Created default admin {}", report.admin.email);
    }
    tracing::info!("{} parking lots ready", report.lots.len());
    tracing::debug!("Bootstrap report: {}", serde_json::to_string(&report)?);

    Ok(())
}
