//! Target and product reads. The core only reads these tables — the catalog
//! owns writes.

use crate::db::DbContext;
use crate::error::Result;
use crate::models::TargetWithProduct;

pub struct TargetOps<'a> {
    ctx: &'a DbContext,
}

impl<'a> TargetOps<'a> {
    pub(crate) fn new(ctx: &'a DbContext) -> Self {
        Self { ctx }
    }

    /// All targets with `active = true`, joined with their product.
    pub async fn active(&self) -> Result<Vec<TargetWithProduct>> {
        let rows = sqlx::query_as::<_, TargetWithProduct>(
            r#"
            SELECT t.id, t.product_id, t.domain, t.url, t.active,
                   p.sku, p.title, p.brand
            FROM targets t
            JOIN products p ON p.id = t.product_id
            WHERE t.active = TRUE
            "#,
        )
        .fetch_all(self.ctx.pool())
        .await?;

        Ok(rows)
    }
}
