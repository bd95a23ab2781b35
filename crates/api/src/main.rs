use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use therapy_coach_api::{
    app,
    config::Config,
    jobs::{
        AdminSessionCleanupJob, ExpireStalePaymentsJob, JobScheduler, PoolMetricsJob,
        RateLimiterPruneJob,
    },
    middleware, services,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    middleware::logging::init_logging(&config.logging)?;
    middleware::init_metrics()?;

    info!("Starting Therapy Coach API v{}", env!("CARGO_PKG_VERSION"));

    let pool = persistence::db::create_pool(&(&config.database).into()).await?;

    info!("Running database migrations...");
    persistence::db::run_migrations(&pool).await?;
    info!("Migrations completed");

    let mut scheduler = JobScheduler::new();
    scheduler.register(PoolMetricsJob::new(pool.clone()));
    scheduler.register(ExpireStalePaymentsJob::new(
        pool.clone(),
        config.payments.pending_expiry_hours,
    ));
    scheduler.register(AdminSessionCleanupJob::new(pool.clone()));

    let addr = config.socket_addr()?;
    let text_generator = services::build_text_generator(&config.text_generation);
    let state = app::AppState::new(config, pool, text_generator)?;
    if let Some(limiter) = state.rate_limiter.clone() {
        scheduler.register(RateLimiterPruneJob::new(limiter));
    }
    scheduler.start();

    let app = app::router(state);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(10)).await;
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
