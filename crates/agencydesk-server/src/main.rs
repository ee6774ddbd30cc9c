//! agencydesk server entry point.

use agencydesk_db::{DbManager, run_migrations};
use agencydesk_server::bootstrap::seed_master_admin;
use agencydesk_server::{AppState, ServerConfig, router};
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("agencydesk=info".parse()?))
        .json()
        .init();

    let config = ServerConfig::parse();
    tracing::info!(bind = %config.bind, db = %config.db_url, "starting agencydesk");

    let db = DbManager::connect(&config.db_config()).await?;
    run_migrations(db.client()).await?;

    let state = AppState::new(db.client().clone(), config.auth_config());
    match config.admin_seed() {
        Some(seed) => {
            seed_master_admin(state.store.as_ref(), &seed).await?;
        }
        None => tracing::warn!("ADMIN_PASSWORD not set; skipping master admin seeding"),
    }

    let listener = TcpListener::bind(config.bind).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, router(state)).await?;

    tracing::info!("agencydesk stopped");
    Ok(())
}
