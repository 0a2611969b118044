//! Periodic control loop that promotes active targets into pending scrape jobs.

use clap::Parser;
use figment::providers::Env;
use figment::Figment;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use tracing::info;

use pricewatch::cli::Args;
use pricewatch::config::Config;
use pricewatch::db::DbContext;
use pricewatch::logging::setup_logging;
use pricewatch::metrics;
use pricewatch::scheduler::Scheduler;
use pricewatch::services::manager::ServiceManager;
use pricewatch::services::metrics_service::MetricsService;
use pricewatch::services::scheduler_service::SchedulerService;
use pricewatch::signals::handle_shutdown_signals;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config: Config = Figment::new()
        .merge(Env::raw())
        .extract()
        .expect("failed to load config");

    setup_logging(&config, args.tracing);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        interval_seconds = config.scheduler_interval_seconds,
        "starting scheduler"
    );

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .expect("failed to create database pool");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("failed to run database migrations");

    let db = DbContext::new(pool);
    let scheduler = Scheduler::new(
        db,
        Duration::from_secs(config.scheduler_interval_seconds),
    );

    let metrics_handle = metrics::install_recorder();

    let mut service_manager = ServiceManager::new();
    service_manager.register_service("scheduler", Box::new(SchedulerService::new(scheduler)));
    service_manager.register_service(
        "metrics",
        Box::new(MetricsService::new(
            metrics_handle,
            config.scheduler_metrics_port,
        )),
    );
    service_manager.spawn_all();

    handle_shutdown_signals(service_manager, config.shutdown_timeout).await
}
