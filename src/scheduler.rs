//! Periodic control loop that turns active targets into pending scrape jobs.

use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time;
use tracing::{error, info};

use crate::db::DbContext;

pub struct Scheduler {
    db: DbContext,
    interval: Duration,
}

impl Scheduler {
    pub fn new(db: DbContext, interval: Duration) -> Self {
        Self { db, interval }
    }

    /// Runs until `shutdown_rx` fires. Exceptions from a single cycle are
    /// logged and do not stop the loop — the loop still sleeps the full
    /// interval before the next iteration.
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) {
        info!("scheduler started");
        loop {
            tokio::select! {
                _ = self.run_cycle() => {}
                _ = shutdown_rx.recv() => {
                    info!("scheduler shutting down");
                    return;
                }
            }

            tokio::select! {
                _ = time::sleep(self.interval) => {}
                _ = shutdown_rx.recv() => {
                    info!("scheduler shutting down");
                    return;
                }
            }
        }
    }

    async fn run_cycle(&self) {
        let targets = match self.db.targets().active().await {
            Ok(targets) => targets,
            Err(e) => {
                error!(error = ?e, "failed to read active targets");
                metrics::counter!(crate::metrics::SCHEDULER_CYCLES_TOTAL).increment(1);
                return;
            }
        };

        for target in &targets {
            if let Err(e) = self.db.jobs().upsert_pending(target.id).await {
                error!(error = ?e, target_id = target.id, "failed to upsert pending job");
            }
        }

        metrics::counter!(crate::metrics::SCHEDULER_CYCLES_TOTAL).increment(1);
        metrics::gauge!(crate::metrics::SCHEDULER_LAST_TARGETS_COUNT).set(targets.len() as f64);

        info!(target_count = targets.len(), "scheduler cycle complete");
    }
}
