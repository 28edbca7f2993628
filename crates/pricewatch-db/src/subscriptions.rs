//! Database operations for the `subscriptions` table.

use chrono::{DateTime, Utc};
use pricewatch_core::{StoreError, Subscription, Target, UserId};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `subscriptions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SubscriptionRow {
    pub user_id: i64,
    pub target_kind: String,
    pub target_value: String,
    pub threshold: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub last_notified_at: Option<DateTime<Utc>>,
}

impl SubscriptionRow {
    /// Converts the row into a domain subscription.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidRecord`] if the target columns or the
    /// threshold do not form a valid subscription.
    pub fn into_subscription(self) -> Result<Subscription, StoreError> {
        let invalid = |reason: String| StoreError::InvalidRecord {
            user_id: self.user_id,
            reason,
        };
        let target = Target::from_parts(&self.target_kind, &self.target_value)
            .map_err(|e| invalid(e.to_string()))?;
        Subscription::new(self.user_id, target, self.threshold).map_err(|e| invalid(e.to_string()))
    }
}

const COLUMNS: &str = "user_id, target_kind, target_value, threshold, created_at, updated_at, \
                       last_checked_at, last_notified_at";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns all subscriptions, ordered by user id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_subscriptions(pool: &PgPool) -> Result<Vec<SubscriptionRow>, DbError> {
    let rows = sqlx::query_as::<_, SubscriptionRow>(&format!(
        "SELECT {COLUMNS} FROM subscriptions ORDER BY user_id"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the subscription for `user_id`, or `None` if there is none.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_subscription(
    pool: &PgPool,
    user_id: UserId,
) -> Result<Option<SubscriptionRow>, DbError> {
    let row = sqlx::query_as::<_, SubscriptionRow>(&format!(
        "SELECT {COLUMNS} FROM subscriptions WHERE user_id = $1"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Inserts or replaces the subscription for `user_id`. `created_at` and the
/// check/notify stamps survive a replacement.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn upsert_subscription(
    pool: &PgPool,
    user_id: UserId,
    target: &Target,
    threshold: Decimal,
) -> Result<SubscriptionRow, DbError> {
    let row = sqlx::query_as::<_, SubscriptionRow>(&format!(
        "INSERT INTO subscriptions (user_id, target_kind, target_value, threshold) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (user_id) DO UPDATE SET \
             target_kind = EXCLUDED.target_kind, \
             target_value = EXCLUDED.target_value, \
             threshold = EXCLUDED.threshold, \
             updated_at = now() \
         RETURNING {COLUMNS}"
    ))
    .bind(user_id)
    .bind(target.kind())
    .bind(target.value())
    .bind(threshold)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Deletes the subscription for `user_id`. Returns `true` if a row was removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn delete_subscription(pool: &PgPool, user_id: UserId) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM subscriptions WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Stamps a delivered notification. A successful send is also a check.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn mark_notified(
    pool: &PgPool,
    user_id: UserId,
    notified_at: DateTime<Utc>,
) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE subscriptions \
         SET last_notified_at = $2, last_checked_at = GREATEST(last_checked_at, $2) \
         WHERE user_id = $1",
    )
    .bind(user_id)
    .bind(notified_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Stamps a completed check.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn mark_checked(
    pool: &PgPool,
    user_id: UserId,
    checked_at: DateTime<Utc>,
) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE subscriptions SET last_checked_at = GREATEST(last_checked_at, $2) \
         WHERE user_id = $1",
    )
        .bind(user_id)
        .bind(checked_at)
        .execute(pool)
        .await?;

    Ok(())
}
