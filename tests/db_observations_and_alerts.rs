mod helpers;

use pricewatch::models::{AlertType, NewPriceObservation};
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test]
async fn latest_returns_none_with_no_observations(pool: PgPool) {
    let product = helpers::insert_product(&pool, "SKU1", "Widget").await;
    let target = helpers::insert_target(&pool, product, "amazon.in", "https://amazon.in/x", true).await;

    let db = helpers::ctx(pool);
    assert!(db.observations().latest(target).await.unwrap().is_none());
}

#[sqlx::test]
async fn save_then_latest_round_trips_the_most_recent_price(pool: PgPool) {
    let product = helpers::insert_product(&pool, "SKU1", "Widget").await;
    let target = helpers::insert_target(&pool, product, "amazon.in", "https://amazon.in/x", true).await;

    let db = helpers::ctx(pool);
    let first = NewPriceObservation {
        target_id: target,
        price: Decimal::new(99900, 2),
        currency: "INR".to_string(),
        raw_html: "<html>old</html>".to_string(),
        screenshot_url: None,
        proxy_used: None,
        user_agent: "ua-1".to_string(),
        response_time_ms: 120,
        content_hash: "abc123".to_string(),
    };
    db.observations().save(&first).await.unwrap();

    let second = NewPriceObservation {
        price: Decimal::new(89900, 2),
        raw_html: "<html>new</html>".to_string(),
        content_hash: "def456".to_string(),
        ..first.clone()
    };
    db.observations().save(&second).await.unwrap();

    let latest = db.observations().latest(target).await.unwrap().unwrap();
    assert_eq!(latest.price, Decimal::new(89900, 2));
}

#[sqlx::test]
async fn alert_create_returns_a_new_id(pool: PgPool) {
    let product = helpers::insert_product(&pool, "SKU1", "Widget").await;

    let db = helpers::ctx(pool);
    let id = db
        .alerts()
        .create(
            product,
            AlertType::PriceDrop,
            json!({"old_price": "999.00", "new_price": "899.00"}),
        )
        .await
        .unwrap();

    assert!(id > 0);
}
