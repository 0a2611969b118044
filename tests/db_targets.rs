mod helpers;

use sqlx::PgPool;

#[sqlx::test]
async fn active_excludes_inactive(pool: PgPool) {
    let product = helpers::insert_product(&pool, "SKU1", "Widget").await;
    let active_target = helpers::insert_target(&pool, product, "amazon.in", "https://amazon.in/x", true).await;
    helpers::insert_target(&pool, product, "amazon.in", "https://amazon.in/y", false).await;

    let db = helpers::ctx(pool);
    let targets = db.targets().active().await.unwrap();

    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].id, active_target);
    assert_eq!(targets[0].title, "Widget");
    assert_eq!(targets[0].sku, "SKU1");
}

#[sqlx::test]
async fn active_returns_empty_with_no_targets(pool: PgPool) {
    let db = helpers::ctx(pool);
    let targets = db.targets().active().await.unwrap();
    assert!(targets.is_empty());
}

#[sqlx::test]
async fn active_joins_product_fields(pool: PgPool) {
    let product = helpers::insert_product(&pool, "SKU2", "Gadget").await;
    helpers::insert_target(&pool, product, "flipkart.com", "https://flipkart.com/z", true).await;

    let db = helpers::ctx(pool);
    let targets = db.targets().active().await.unwrap();

    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].domain, "flipkart.com");
    assert_eq!(targets[0].brand, None);
}
