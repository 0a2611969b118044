//! Dequeues pending scrape jobs and runs the fetch/parse/persist/alert pipeline.

use clap::Parser;
use figment::providers::Env;
use figment::Figment;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;

use pricewatch::alert_sink::AlertSink;
use pricewatch::cli::Args;
use pricewatch::config::Config;
use pricewatch::db::DbContext;
use pricewatch::logging::setup_logging;
use pricewatch::metrics;
use pricewatch::page_fetcher::{ChromiumPageFetcher, PageFetcher};
use pricewatch::parsers::ParserRegistry;
use pricewatch::proxy_pool::ProxyPool;
use pricewatch::rate_gate::RateGate;
use pricewatch::services::manager::ServiceManager;
use pricewatch::services::metrics_service::MetricsService;
use pricewatch::services::worker_service::WorkerPoolService;
use pricewatch::signals::handle_shutdown_signals;
use pricewatch::ua_pool::UaPool;

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
        worker_count = config.worker_count,
        "starting worker"
    );

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .expect("failed to create database pool");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("failed to run database migrations");

    let db = DbContext::new(pool);

    let proxies = ProxyPool::new(config.proxies());
    let uas = UaPool::new();
    let fetcher: Arc<dyn PageFetcher> = Arc::new(ChromiumPageFetcher::new(proxies, uas));
    let parsers = Arc::new(ParserRegistry::new());
    let rate_gate = RateGate::new(&config.redis_url).expect("failed to connect to redis");
    let alerts = AlertSink::new(
        config.discord_webhook_url.clone(),
        config.telegram_bot_token.clone(),
        config.telegram_chat_id.clone(),
    );

    let metrics_handle = metrics::install_recorder();

    let mut service_manager = ServiceManager::new();
    service_manager.register_service(
        "worker_pool",
        Box::new(WorkerPoolService::new(
            config.worker_count,
            db,
            fetcher,
            parsers,
            rate_gate,
            alerts,
            config.max_retries,
        )),
    );
    service_manager.register_service(
        "metrics",
        Box::new(MetricsService::new(
            metrics_handle,
            config.scraper_metrics_port,
        )),
    );
    service_manager.spawn_all();

    handle_shutdown_signals(service_manager, config.shutdown_timeout).await
}
