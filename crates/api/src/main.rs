use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use worktrack_api::app::create_app;
use worktrack_api::config::Config;
use worktrack_api::jobs::{GpsRetentionJob, JobScheduler, PoolMetricsJob, SessionCleanupJob};
use worktrack_api::middleware::{init_metrics, logging::init_logging};
use worktrack_api::services::admin_bootstrap::{bootstrap_admin, BootstrapOutcome};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load().context("loading configuration")?;
    init_logging(&config.logging);
    init_metrics().context("installing Prometheus recorder")?;

    info!("Starting Worktrack API v{}", env!("CARGO_PKG_VERSION"));

    let db_config = persistence::db::DatabaseConfig::from(&config.database);
    let pool = persistence::db::create_pool(&db_config)
        .await
        .context("connecting to database")?;

    info!("Running database migrations");
    sqlx::migrate!("../persistence/src/migrations")
        .run(&pool)
        .await?;

    match bootstrap_admin(&pool, &config.bootstrap).await? {
        BootstrapOutcome::Created => info!(email = %config.bootstrap.admin_email, "Created bootstrap admin"),
        BootstrapOutcome::AlreadyPresent => info!("Admin account already present"),
        BootstrapOutcome::NotConfigured => {}
    }

    let mut scheduler = JobScheduler::new();
    if config.jobs.enabled {
        scheduler.register(GpsRetentionJob::new(
            pool.clone(),
            config.jobs.retention_interval_secs,
            config.jobs.retention_batch_size,
        ));
        scheduler.register(SessionCleanupJob::new(pool.clone()));
        scheduler.register(PoolMetricsJob::new(pool.clone()));
        scheduler.start();
    } else {
        warn!("Background jobs disabled");
    }

    let addr = config.socket_addr()?;
    let app = create_app(config, pool).context("building JWT keys")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(30)).await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
