use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use meditrack::api::router::api_router;
use meditrack::core_state::CoreState;
use meditrack::{config, db, reconcile};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let db_path = config::db_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Run migrations up front so a schema problem fails the boot, not
    // the first request.
    {
        let conn = db::open_database(&db_path)?;
        let tables = db::count_tables(&conn)?;
        tracing::info!(path = %db_path.display(), tables, "Database ready");
    }

    let core = Arc::new(CoreState::with_db_path(db_path));

    let mut sweeper = reconcile::spawn_sweeper(
        core.clone(),
        Duration::from_secs(config::sweep_interval_secs()),
    );

    let addr = config::bind_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");

    axum::serve(listener, api_router(core))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.shutdown();
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
}
