//! Serves the Prometheus `/metrics` endpoint as a supervised `Service`.

use super::Service;
use metrics_exporter_prometheus::PrometheusHandle;

pub struct MetricsService {
    handle: PrometheusHandle,
    port: u16,
}

impl MetricsService {
    pub fn new(handle: PrometheusHandle, port: u16) -> Self {
        Self { handle, port }
    }
}

#[async_trait::async_trait]
impl Service for MetricsService {
    fn name(&self) -> &'static str {
        "metrics"
    }

    async fn run(&mut self) -> Result<(), anyhow::Error> {
        crate::metrics::serve(self.handle.clone(), self.port).await
    }

    /// The metrics server has no graceful drain of its own; dropping the
    /// `run` future when the outer shutdown signal fires is sufficient.
    async fn shutdown(&mut self) -> Result<(), anyhow::Error> {
        Ok(())
    }
}
