//! Shared seeding helpers for `DbContext` integration tests.

use pricewatch::db::DbContext;
use sqlx::PgPool;

pub async fn insert_product(pool: &PgPool, sku: &str, title: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO products (sku, title, brand) VALUES ($1, $2, NULL) RETURNING id",
    )
    .bind(sku)
    .bind(title)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn insert_target(pool: &PgPool, product_id: i64, domain: &str, url: &str, active: bool) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO targets (product_id, domain, url, active) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(product_id)
    .bind(domain)
    .bind(url)
    .bind(active)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub fn ctx(pool: PgPool) -> DbContext {
    DbContext::new(pool)
}
