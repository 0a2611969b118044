//! Price observation persistence and latest-price lookup.

use crate::db::DbContext;
use crate::error::Result;
use crate::models::{LatestPrice, NewPriceObservation};

pub struct ObservationOps<'a> {
    ctx: &'a DbContext,
}

impl<'a> ObservationOps<'a> {
    pub(crate) fn new(ctx: &'a DbContext) -> Self {
        Self { ctx }
    }

    pub async fn save(&self, obs: &NewPriceObservation) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO price_history (
                target_id, price, currency, scraped_at, raw_html,
                screenshot_url, proxy_used, user_agent, response_time_ms, content_hash
            ) VALUES ($1, $2, $3, NOW(), $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(obs.target_id)
        .bind(obs.price)
        .bind(&obs.currency)
        .bind(&obs.raw_html)
        .bind(&obs.screenshot_url)
        .bind(&obs.proxy_used)
        .bind(&obs.user_agent)
        .bind(obs.response_time_ms)
        .bind(&obs.content_hash)
        .execute(self.ctx.pool())
        .await?;

        Ok(())
    }

    /// Most recent prior observation for `target_id`, if any.
    pub async fn latest(&self, target_id: i64) -> Result<Option<LatestPrice>> {
        let row = sqlx::query_as::<_, LatestPrice>(
            "SELECT price, scraped_at FROM price_history
             WHERE target_id = $1
             ORDER BY scraped_at DESC
             LIMIT 1",
        )
        .bind(target_id)
        .fetch_optional(self.ctx.pool())
        .await?;

        Ok(row)
    }
}
