//! Dequeues pending scrape jobs and runs the fetch → parse → persist →
//! alert pipeline for each, honouring the domain rate gate and the retry /
//! proxy-health machinery along the way.

use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time;
use tracing::{debug, error, info, warn};

use crate::alert_sink::{AlertSink, TargetInfo};
use crate::db::DbContext;
use crate::models::{AlertType, NewPriceObservation, ScrapeJobStatus, TargetWithProduct, truncate_raw_html};
use crate::page_fetcher::PageFetcher;
use crate::parsers::{ParserRegistry, content_hash, detect_captcha};
use crate::rate_gate::{self, RateGate};
use crate::retry::RetryPolicy;

const POLITE_DELAY: Duration = Duration::from_secs(2);
const CYCLE_SLEEP: Duration = Duration::from_secs(60);
const IDLE_SLEEP: Duration = Duration::from_secs(5);
const ERROR_BACKOFF: Duration = Duration::from_secs(10);

/// 5% or greater drop from the prior observation fires a price-drop alert.
const PRICE_DROP_THRESHOLD: Decimal = Decimal::from_parts(95, 0, 0, false, 2);

pub struct Worker {
    id: usize,
    db: DbContext,
    fetcher: Arc<dyn PageFetcher>,
    parsers: Arc<ParserRegistry>,
    rate_gate: RateGate,
    alerts: AlertSink,
    retry: RetryPolicy,
    max_retries: u32,
}

impl Worker {
    pub fn new(
        id: usize,
        db: DbContext,
        fetcher: Arc<dyn PageFetcher>,
        parsers: Arc<ParserRegistry>,
        rate_gate: RateGate,
        alerts: AlertSink,
        max_retries: u32,
    ) -> Self {
        Self {
            id,
            db,
            fetcher,
            parsers,
            rate_gate,
            alerts,
            retry: RetryPolicy::default(),
            max_retries,
        }
    }

    /// Runs until `shutdown_rx` fires. A single target's failure never
    /// aborts the loop; a worker-level failure (e.g. losing the database)
    /// backs off for 10s before the next poll.
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) {
        info!(worker_id = self.id, "worker started");
        loop {
            tokio::select! {
                outcome = self.db.jobs().lock_next() => {
                    match outcome {
                        Ok(Some((job, target))) => {
                            let started = std::time::Instant::now();
                            if let Err(e) = self.process_target(job.id, job.attempts, &target).await {
                                error!(worker_id = self.id, job_id = job.id, error = ?e, "failed to process target");
                            }
                            metrics::gauge!(
                                crate::metrics::SCRAPER_LAST_DURATION_SECONDS,
                                "domain" => target.domain.clone()
                            )
                            .set(started.elapsed().as_secs_f64());

                            time::sleep(POLITE_DELAY).await;
                        }
                        Ok(None) => {
                            debug!(worker_id = self.id, "no pending jobs, waiting");
                            time::sleep(IDLE_SLEEP).await;
                        }
                        Err(e) => {
                            warn!(worker_id = self.id, error = ?e, "failed to lock next job");
                            time::sleep(ERROR_BACKOFF).await;
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!(worker_id = self.id, "worker shutting down");
                    return;
                }
            }
        }
    }

    /// Per-target pipeline: rate gate, fetch, CAPTCHA check, parse, compare
    /// against the latest known price, persist, alert.
    async fn process_target(
        &self,
        job_id: i64,
        attempts: i32,
        target: &TargetWithProduct,
    ) -> anyhow::Result<()> {
        let wait = self.rate_gate.check(&target.domain).await?;
        if wait > 0 {
            debug!(domain = %target.domain, wait, "rate gate active, waiting");
            time::sleep(Duration::from_secs(wait)).await;
        }

        let fetcher = self.fetcher.clone();
        let url = target.url.clone();
        let fetch_result = self
            .retry
            .run(|| {
                let fetcher = fetcher.clone();
                let url = url.clone();
                async move { fetcher.fetch(&url, None).await }
            })
            .await;

        let fetched = match fetch_result {
            Ok(f) => f,
            Err(e) => {
                self.db
                    .jobs()
                    .update_status(job_id, ScrapeJobStatus::Failed, Some(&e.to_string()))
                    .await?;
                self.rate_gate.set(&target.domain, rate_gate::FAILURE_TTL).await?;
                metrics::counter!(crate::metrics::SCRAPER_FAILURE_TOTAL, "domain" => target.domain.clone())
                    .increment(1);
                self.alert_if_repeatedly_failing(target, attempts).await?;
                return Ok(());
            }
        };

        if detect_captcha(&fetched.html) {
            warn!(domain = %target.domain, "captcha encountered");
            self.db
                .jobs()
                .update_status(job_id, ScrapeJobStatus::Captcha, Some("CAPTCHA encountered"))
                .await?;
            self.rate_gate.set(&target.domain, rate_gate::CAPTCHA_TTL).await?;
            metrics::counter!(crate::metrics::SCRAPER_CAPTCHA_TOTAL, "domain" => target.domain.clone())
                .increment(1);

            self.alerts
                .captcha_encounter(&self.db, &target_info(target), fetched.screenshot_path.as_deref())
                .await?;
            return Ok(());
        }

        let Some(parser) = self.parsers.get(&target.domain) else {
            error!(domain = %target.domain, "no parser registered and no fallback configured");
            // Job status is left untouched (per spec), but the lock taken by
            // `lock_next` must still be released so the job doesn't sit
            // locked until its lock expiry.
            self.db.jobs().unlock(job_id).await?;
            return Ok(());
        };

        let Some(parsed) = parser.parse_price(&fetched.html) else {
            self.db
                .jobs()
                .update_status(job_id, ScrapeJobStatus::Failed, Some("Price parsing failed"))
                .await?;
            self.rate_gate.set(&target.domain, rate_gate::FAILURE_TTL).await?;
            metrics::counter!(crate::metrics::SCRAPER_FAILURE_TOTAL, "domain" => target.domain.clone())
                .increment(1);
            self.alert_if_repeatedly_failing(target, attempts).await?;
            return Ok(());
        };

        let prior = self.db.observations().latest(target.id).await?;
        if let Some(prior) = &prior {
            let threshold = prior.price * PRICE_DROP_THRESHOLD;
            if parsed.price < threshold {
                self.alerts
                    .price_drop(&self.db, &target_info(target), prior.price, parsed.price)
                    .await?;
            }
        }

        let observation = NewPriceObservation {
            target_id: target.id,
            price: parsed.price,
            currency: parsed.currency,
            raw_html: truncate_raw_html(&fetched.html),
            screenshot_url: fetched.screenshot_path,
            proxy_used: fetched.proxy,
            user_agent: fetched.user_agent,
            response_time_ms: fetched.response_time_ms as i32,
            content_hash: content_hash(&fetched.html),
        };
        self.db.observations().save(&observation).await?;
        self.db
            .jobs()
            .update_status(job_id, ScrapeJobStatus::Success, None)
            .await?;
        self.rate_gate.set(&target.domain, rate_gate::SUCCESS_TTL).await?;
        metrics::counter!(crate::metrics::SCRAPER_SUCCESS_TOTAL, "domain" => target.domain.clone())
            .increment(1);

        Ok(())
    }

    /// Fires a `repeated_errors` alert once a job's attempt count (driven by
    /// the Scheduler's per-cycle upsert, not this single fetch) has reached
    /// `max_retries`. The job itself is still left `Failed` for the next
    /// Scheduler cycle to re-queue — this only raises visibility.
    async fn alert_if_repeatedly_failing(
        &self,
        target: &TargetWithProduct,
        attempts: i32,
    ) -> anyhow::Result<()> {
        if attempts as u32 >= self.max_retries {
            warn!(domain = %target.domain, attempts, "job exceeded max_retries");
            self.alerts
                .repeated_errors(&self.db, &target_info(target), attempts as u32)
                .await?;
        }
        Ok(())
    }
}

fn target_info(target: &TargetWithProduct) -> TargetInfo {
    TargetInfo {
        product_id: target.product_id,
        title: target.title.clone(),
        domain: target.domain.clone(),
        url: target.url.clone(),
    }
}

/// Runs `count` worker tasks sharing one `DbContext`, stopping all of them
/// when `shutdown_rx` fires.
pub async fn run_pool(
    count: usize,
    db: DbContext,
    fetcher: Arc<dyn PageFetcher>,
    parsers: Arc<ParserRegistry>,
    rate_gate: RateGate,
    alerts: AlertSink,
    max_retries: u32,
    shutdown_tx: &broadcast::Sender<()>,
) {
    if let Err(e) = db.jobs().force_unlock_all().await {
        error!(error = ?e, "failed to force-unlock stale jobs at startup");
    }

    let mut handles = Vec::with_capacity(count);
    for id in 0..count {
        let worker = Worker::new(
            id,
            db.clone(),
            fetcher.clone(),
            parsers.clone(),
            rate_gate.clone(),
            alerts.clone(),
            max_retries,
        );
        let rx = shutdown_tx.subscribe();
        handles.push(tokio::spawn(async move { worker.run(rx).await }));
    }

    futures::future::join_all(handles).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_drop_boundary_matches_spec_examples() {
        let old = Decimal::new(100000, 2); // 1000.00
        let exactly_five_percent = old * PRICE_DROP_THRESHOLD; // 950.00
        let just_over = old * Decimal::new(9499, 4); // 949.90

        // new = old * 0.95 does NOT alert (strict less-than)
        assert!(!(exactly_five_percent < exactly_five_percent));
        // new = old * 0.9499 DOES alert
        assert!(just_over < exactly_five_percent);
    }
}
