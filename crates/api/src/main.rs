use anyhow::{Context, Result};
use domain::services::SystemClock;
use persistence::{PgNotifyJobQueue, PgPolicyStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use rmm_policy_api::app::{create_app, AppState};
use rmm_policy_api::config::Config;
use rmm_policy_api::jobs::{JobScheduler, PatchScheduleScanJob, PoolMetricsJob};
use rmm_policy_api::middleware;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    middleware::logging::init_logging(&config.logging)?;
    middleware::init_metrics()?;

    info!("Starting RMM policy service v{}", env!("CARGO_PKG_VERSION"));

    let db_config: persistence::db::DatabaseConfig = (&config.database).into();
    let pool = persistence::db::create_pool(&db_config).await?;

    info!("Running database migrations...");
    persistence::db::run_migrations(&pool).await?;
    info!("Migrations completed");

    let store = Arc::new(PgPolicyStore::new(pool.clone()));
    let job_queue = Arc::new(PgNotifyJobQueue::new(pool.clone()));
    let state = AppState::new(config.clone(), store, job_queue, Arc::new(SystemClock));

    let mut scheduler = JobScheduler::new();
    if config.scheduler.enabled {
        scheduler.register(PatchScheduleScanJob::new(
            state.patch_scheduler.clone(),
            config.scheduler.patch_scan_interval_secs,
        ));
        scheduler.register(PoolMetricsJob::new(
            pool.clone(),
            config.scheduler.pool_metrics_interval_secs,
        ));
        scheduler.start();
    } else {
        info!("Background jobs disabled");
    }

    let app = create_app(state);

    let addr = config.socket_addr().context("Invalid server address")?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(30)).await;
    pool.close().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
