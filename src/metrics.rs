//! Prometheus metrics exposition, shared shape for both binaries.
//!
//! Each process installs one `PrometheusHandle` as the global `metrics`
//! recorder and serves its text exposition over a tiny axum router bound to
//! its own port (`SCHEDULER_METRICS_PORT` / `SCRAPER_METRICS_PORT`).

use axum::Router;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use tracing::info;

pub const SCHEDULER_CYCLES_TOTAL: &str = "scheduler_cycles_total";
pub const SCHEDULER_LAST_TARGETS_COUNT: &str = "scheduler_last_targets_count";
pub const SCRAPER_SUCCESS_TOTAL: &str = "scraper_success_total";
pub const SCRAPER_FAILURE_TOTAL: &str = "scraper_failure_total";
pub const SCRAPER_CAPTCHA_TOTAL: &str = "scraper_captcha_total";
pub const SCRAPER_LAST_DURATION_SECONDS: &str = "scraper_last_duration_seconds";

/// Installs the process-global Prometheus recorder. Call once at startup,
/// before any `metrics::counter!`/`metrics::gauge!` call.
pub fn install_recorder() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install prometheus recorder")
}

/// Serves `GET /metrics` on `port` until the returned future is dropped or
/// cancelled by the caller's shutdown signal.
pub async fn serve(handle: PrometheusHandle, port: u16) -> anyhow::Result<()> {
    let app = Router::new()
        .route("/metrics", get(render_metrics))
        .with_state(handle);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "metrics endpoint listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn render_metrics(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}
