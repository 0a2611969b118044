//! Durable alert records. The alert row is the record of truth; outbound
//! webhook dispatch (`AlertSink`) is best-effort on top of it.

use crate::db::DbContext;
use crate::error::Result;
use crate::models::AlertType;

pub struct AlertOps<'a> {
    ctx: &'a DbContext,
}

impl<'a> AlertOps<'a> {
    pub(crate) fn new(ctx: &'a DbContext) -> Self {
        Self { ctx }
    }

    pub async fn create(&self, product_id: i64, alert_type: AlertType, payload: serde_json::Value) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO alerts (product_id, alert_type, payload, resolved, created_at)
             VALUES ($1, $2, $3, FALSE, NOW())
             RETURNING id",
        )
        .bind(product_id)
        .bind(alert_type.as_str())
        .bind(payload)
        .fetch_one(self.ctx.pool())
        .await?;

        Ok(id)
    }
}
