//! Live tests for `PgPreferenceStore` using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database. They need
//! `DATABASE_URL` and are ignored by default:
//! `cargo test -p pricewatch-db -- --ignored`.

use chrono::{TimeZone, Utc};
use pricewatch_core::{NotificationRecord, PreferenceStore, Target};
use pricewatch_db::{get_subscription, PgPreferenceStore};
use rust_decimal::Decimal;

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn upsert_get_and_replace(pool: sqlx::PgPool) {
    let store = PgPreferenceStore::new(pool);

    store
        .upsert(42, Target::Category(3192), Decimal::from(50_000))
        .await
        .unwrap();
    store
        .upsert(42, Target::Query("ноутбук".to_string()), Decimal::new(4_999_950, 2))
        .await
        .unwrap();

    let sub = store.get(42).await.unwrap().unwrap();
    assert_eq!(sub.target, Target::Query("ноутбук".to_string()));
    assert_eq!(sub.threshold, Decimal::new(4_999_950, 2));
    assert_eq!(store.list_subscriptions().await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn remove_and_list_order(pool: sqlx::PgPool) {
    let store = PgPreferenceStore::new(pool);
    for user_id in [3, 1, 2] {
        store
            .upsert(user_id, Target::Category(617), Decimal::from(100))
            .await
            .unwrap();
    }

    assert!(store.remove(2).await.unwrap());
    assert!(!store.remove(2).await.unwrap());

    let ids: Vec<i64> = store
        .list_subscriptions()
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.user_id)
        .collect();
    assert_eq!(ids, vec![1, 3]);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn notification_stamps_columns(pool: sqlx::PgPool) {
    let store = PgPreferenceStore::new(pool.clone());
    store
        .upsert(7, Target::Category(617), Decimal::from(100))
        .await
        .unwrap();

    let at = Utc::now();
    store
        .record_notification(&NotificationRecord {
            user_id: 7,
            notified_at: at,
        })
        .await
        .unwrap();

    let row = get_subscription(&pool, 7).await.unwrap().unwrap();
    assert!(row.last_notified_at.is_some());
    assert!(row.last_checked_at.is_some());
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn late_check_stamp_does_not_move_backwards(pool: sqlx::PgPool) {
    let store = PgPreferenceStore::new(pool.clone());
    store
        .upsert(7, Target::Category(617), Decimal::from(100))
        .await
        .unwrap();

    let earlier = Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 0).unwrap();
    let later = Utc.with_ymd_and_hms(2026, 1, 1, 10, 10, 0).unwrap();
    store.record_check(7, later).await.unwrap();
    store.record_check(7, earlier).await.unwrap();

    let row = get_subscription(&pool, 7).await.unwrap().unwrap();
    assert_eq!(row.last_checked_at, Some(later));
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn invalid_rows_are_skipped_in_listing(pool: sqlx::PgPool) {
    sqlx::query(
        "INSERT INTO subscriptions (user_id, target_kind, target_value, threshold) \
         VALUES (1, 'category', 'not-a-number', 10)",
    )
    .execute(&pool)
    .await
    .unwrap();

    let store = PgPreferenceStore::new(pool);
    assert!(store.list_subscriptions().await.unwrap().is_empty());
    assert!(store.get(1).await.is_err());
}
