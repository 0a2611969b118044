//! Scrape job queue operations.
//!
//! `scrape_jobs.id` is keyed off `target_id` — there is exactly one job row
//! per target, upserted every scheduler cycle. This prevents concurrent
//! distinct jobs for the same target; preserved intentionally, not an
//! oversight (see design notes).

use crate::db::DbContext;
use crate::error::Result;
use crate::models::{ScrapeJob, ScrapeJobStatus, TargetWithProduct};

/// Lock expiry: a job locked longer than this is assumed abandoned by a
/// crashed worker and becomes eligible for re-locking.
const LOCK_EXPIRY_SECS: i32 = 10 * 60;

pub struct JobOps<'a> {
    ctx: &'a DbContext,
}

impl<'a> JobOps<'a> {
    pub(crate) fn new(ctx: &'a DbContext) -> Self {
        Self { ctx }
    }

    /// Upserts a `pending` job for `target_id`. On conflict, resets status
    /// to `pending`, clears `last_error`, and increments `attempts` — this
    /// happens on every scheduler cycle, not only on worker-level retries.
    pub async fn upsert_pending(&self, target_id: i64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO scrape_jobs (id, target_id, status, attempts, last_error, created_at, updated_at)
            VALUES ($1, $1, 'pending', 0, NULL, NOW(), NOW())
            ON CONFLICT (id) DO UPDATE SET
                status = 'pending',
                last_error = NULL,
                attempts = scrape_jobs.attempts + 1,
                updated_at = NOW()
            "#,
        )
        .bind(target_id)
        .execute(self.ctx.pool())
        .await?;

        Ok(())
    }

    /// Atomically fetches and locks the next eligible pending job: unlocked,
    /// or locked past `LOCK_EXPIRY_SECS` ago (recovers jobs abandoned by a
    /// crashed worker). Returns the job joined with its target and product,
    /// since the worker needs the domain/URL/title to run the pipeline.
    pub async fn lock_next(&self) -> Result<Option<(ScrapeJob, TargetWithProduct)>> {
        let mut tx = self.ctx.pool().begin().await?;

        let job = sqlx::query_as::<_, ScrapeJob>(
            r#"
            SELECT * FROM scrape_jobs
            WHERE status = 'pending'
              AND (locked_at IS NULL
                   OR locked_at < NOW() - make_interval(secs => $1::double precision))
            ORDER BY updated_at ASC
            LIMIT 1
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .bind(LOCK_EXPIRY_SECS)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(job) = job else {
            tx.commit().await?;
            return Ok(None);
        };

        sqlx::query("UPDATE scrape_jobs SET locked_at = NOW() WHERE id = $1")
            .bind(job.id)
            .execute(&mut *tx)
            .await?;

        let target = sqlx::query_as::<_, TargetWithProduct>(
            r#"
            SELECT t.id, t.product_id, t.domain, t.url, t.active,
                   p.sku, p.title, p.brand
            FROM targets t
            JOIN products p ON p.id = t.product_id
            WHERE t.id = $1
            "#,
        )
        .bind(job.target_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some((job, target)))
    }

    /// Records a terminal outcome and releases the lock.
    pub async fn update_status(
        &self,
        job_id: i64,
        status: ScrapeJobStatus,
        error: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE scrape_jobs SET status = $2, last_error = $3, locked_at = NULL, updated_at = NOW() WHERE id = $1",
        )
        .bind(job_id)
        .bind(status)
        .bind(error)
        .execute(self.ctx.pool())
        .await?;

        Ok(())
    }

    /// Releases a job's lock without changing its status, for retry.
    pub async fn unlock(&self, job_id: i64) -> Result<()> {
        sqlx::query("UPDATE scrape_jobs SET locked_at = NULL WHERE id = $1")
            .bind(job_id)
            .execute(self.ctx.pool())
            .await?;
        Ok(())
    }

    /// Force-unlocks every locked job. Called once at worker startup to
    /// recover jobs left locked by an unclean shutdown.
    pub async fn force_unlock_all(&self) -> Result<u64> {
        let result = sqlx::query("UPDATE scrape_jobs SET locked_at = NULL WHERE locked_at IS NOT NULL")
            .execute(self.ctx.pool())
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn find(&self, job_id: i64) -> Result<Option<ScrapeJob>> {
        let job = sqlx::query_as::<_, ScrapeJob>("SELECT * FROM scrape_jobs WHERE id = $1")
            .bind(job_id)
            .fetch_optional(self.ctx.pool())
            .await?;
        Ok(job)
    }
}
