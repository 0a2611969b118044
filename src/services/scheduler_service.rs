//! Wraps `Scheduler::run` as a supervised `Service`.

use tokio::sync::broadcast;

use super::Service;
use crate::scheduler::Scheduler;

pub struct SchedulerService {
    scheduler: Scheduler,
    shutdown_tx: Option<broadcast::Sender<()>>,
}

impl SchedulerService {
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            scheduler,
            shutdown_tx: None,
        }
    }
}

#[async_trait::async_trait]
impl Service for SchedulerService {
    fn name(&self) -> &'static str {
        "scheduler"
    }

    async fn run(&mut self) -> Result<(), anyhow::Error> {
        let (tx, rx) = broadcast::channel(1);
        self.shutdown_tx = Some(tx);
        self.scheduler.run(rx).await;
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), anyhow::Error> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        Ok(())
    }
}
