use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

mod app;
mod config;
mod error;
mod jobs;
mod middleware;
mod routes;
mod services;

use domain::services::email::EmailSender;
use jobs::{JobScheduler, PendingReminderJob, PoolMetricsJob, WeeklySummaryJob};
use services::{EmailService, NotificationDispatcher};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Load configuration
    let config = config::Config::load()?;

    // Initialize logging
    middleware::logging::init_logging(&config.logging);

    info!("Starting Testimonial Flow API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize Prometheus metrics
    if config.metrics.enabled {
        middleware::metrics::init_metrics();
    }

    // Create database pool
    let pool = persistence::db::create_pool(&config.database.pool_config()).await?;

    // Run migrations
    info!("Running database migrations...");
    sqlx::migrate!("../persistence/src/migrations")
        .run(&pool)
        .await?;
    info!("Migrations completed");

    // Email transport shared by the dispatcher everywhere
    let email: Arc<dyn EmailSender> = Arc::new(EmailService::new(config.email.clone()));

    // Background jobs: weekly summaries, pending reminders, pool gauges
    let shared_config = Arc::new(config.clone());
    let dispatcher =
        NotificationDispatcher::new(pool.clone(), shared_config.clone(), email.clone());

    let mut scheduler = JobScheduler::new();
    scheduler.register(WeeklySummaryJob::new(
        pool.clone(),
        dispatcher.clone(),
        config.notifications.weekly_summary_check_interval_minutes,
    ));
    scheduler.register(PendingReminderJob::new(
        pool.clone(),
        dispatcher.clone(),
        config.notifications.pending_reminder_check_interval_minutes,
    ));
    scheduler.register(PoolMetricsJob::new(pool.clone()));
    scheduler.start();

    // Build application
    let app = app::create_app(config.clone(), pool, email);

    // Start server
    let addr = config.socket_addr();
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // Stop background jobs after the server drains
    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(10)).await;

    info!("Shutdown complete");
    Ok(())
}

/// Resolves when SIGINT or SIGTERM arrives, so the server drains cleanly
/// under both interactive use and a process manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
