//! Wraps a pool of `Worker` tasks as a single supervised `Service`.

use std::sync::Arc;
use tokio::sync::broadcast;

use super::Service;
use crate::alert_sink::AlertSink;
use crate::db::DbContext;
use crate::page_fetcher::PageFetcher;
use crate::parsers::ParserRegistry;
use crate::rate_gate::RateGate;

pub struct WorkerPoolService {
    count: usize,
    db: DbContext,
    fetcher: Arc<dyn PageFetcher>,
    parsers: Arc<ParserRegistry>,
    rate_gate: RateGate,
    alerts: AlertSink,
    max_retries: u32,
    shutdown_tx: Option<broadcast::Sender<()>>,
}

impl WorkerPoolService {
    pub fn new(
        count: usize,
        db: DbContext,
        fetcher: Arc<dyn PageFetcher>,
        parsers: Arc<ParserRegistry>,
        rate_gate: RateGate,
        alerts: AlertSink,
        max_retries: u32,
    ) -> Self {
        Self {
            count,
            db,
            fetcher,
            parsers,
            rate_gate,
            alerts,
            max_retries,
            shutdown_tx: None,
        }
    }
}

#[async_trait::async_trait]
impl Service for WorkerPoolService {
    fn name(&self) -> &'static str {
        "worker_pool"
    }

    async fn run(&mut self) -> Result<(), anyhow::Error> {
        let (tx, _) = broadcast::channel(1);
        self.shutdown_tx = Some(tx.clone());
        crate::worker::run_pool(
            self.count,
            self.db.clone(),
            self.fetcher.clone(),
            self.parsers.clone(),
            self.rate_gate.clone(),
            self.alerts.clone(),
            self.max_retries,
            &tx,
        )
        .await;
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), anyhow::Error> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        Ok(())
    }
}
