mod helpers;

use pricewatch::models::ScrapeJobStatus;
use sqlx::PgPool;

#[sqlx::test]
async fn upsert_pending_is_idempotent_per_target(pool: PgPool) {
    let product = helpers::insert_product(&pool, "SKU1", "Widget").await;
    let target = helpers::insert_target(&pool, product, "amazon.in", "https://amazon.in/x", true).await;

    let db = helpers::ctx(pool);
    db.jobs().upsert_pending(target).await.unwrap();
    db.jobs().upsert_pending(target).await.unwrap();
    db.jobs().upsert_pending(target).await.unwrap();

    let job = db.jobs().find(target).await.unwrap().unwrap();
    assert_eq!(job.status, ScrapeJobStatus::Pending);
    assert_eq!(job.attempts, 2);
    assert_eq!(job.target_id, target);
}

#[sqlx::test]
async fn upsert_pending_clears_last_error_and_resets_status(pool: PgPool) {
    let product = helpers::insert_product(&pool, "SKU1", "Widget").await;
    let target = helpers::insert_target(&pool, product, "amazon.in", "https://amazon.in/x", true).await;

    let db = helpers::ctx(pool);
    db.jobs().upsert_pending(target).await.unwrap();
    db.jobs()
        .update_status(target, ScrapeJobStatus::Failed, Some("timeout"))
        .await
        .unwrap();

    db.jobs().upsert_pending(target).await.unwrap();

    let job = db.jobs().find(target).await.unwrap().unwrap();
    assert_eq!(job.status, ScrapeJobStatus::Pending);
    assert_eq!(job.last_error, None);
}

#[sqlx::test]
async fn lock_next_returns_and_locks_a_pending_job(pool: PgPool) {
    let product = helpers::insert_product(&pool, "SKU1", "Widget").await;
    let target = helpers::insert_target(&pool, product, "amazon.in", "https://amazon.in/x", true).await;

    let db = helpers::ctx(pool);
    db.jobs().upsert_pending(target).await.unwrap();

    let (job, with_product) = db.jobs().lock_next().await.unwrap().unwrap();
    assert_eq!(job.target_id, target);
    assert_eq!(with_product.url, "https://amazon.in/x");

    // Locked job is no longer eligible for a second dequeue.
    let second = db.jobs().lock_next().await.unwrap();
    assert!(second.is_none());
}

#[sqlx::test]
async fn lock_next_skips_when_no_pending_jobs(pool: PgPool) {
    let db = helpers::ctx(pool);
    assert!(db.jobs().lock_next().await.unwrap().is_none());
}

#[sqlx::test]
async fn update_status_releases_the_lock(pool: PgPool) {
    let product = helpers::insert_product(&pool, "SKU1", "Widget").await;
    let target = helpers::insert_target(&pool, product, "amazon.in", "https://amazon.in/x", true).await;

    let db = helpers::ctx(pool);
    db.jobs().upsert_pending(target).await.unwrap();
    db.jobs().lock_next().await.unwrap().unwrap();

    db.jobs()
        .update_status(target, ScrapeJobStatus::Success, None)
        .await
        .unwrap();

    let job = db.jobs().find(target).await.unwrap().unwrap();
    assert_eq!(job.status, ScrapeJobStatus::Success);
    assert_eq!(job.last_error, None);
}

#[sqlx::test]
async fn force_unlock_all_clears_every_lock(pool: PgPool) {
    let product = helpers::insert_product(&pool, "SKU1", "Widget").await;
    let t1 = helpers::insert_target(&pool, product, "amazon.in", "https://amazon.in/x", true).await;
    let t2 = helpers::insert_target(&pool, product, "amazon.in", "https://amazon.in/y", true).await;

    let db = helpers::ctx(pool);
    db.jobs().upsert_pending(t1).await.unwrap();
    db.jobs().upsert_pending(t2).await.unwrap();
    db.jobs().lock_next().await.unwrap().unwrap();
    db.jobs().lock_next().await.unwrap().unwrap();

    // Both jobs are now locked; nothing left to dequeue.
    assert!(db.jobs().lock_next().await.unwrap().is_none());

    let unlocked = db.jobs().force_unlock_all().await.unwrap();
    assert_eq!(unlocked, 2);

    assert!(db.jobs().lock_next().await.unwrap().is_some());
}
