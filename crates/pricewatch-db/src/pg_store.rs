use chrono::{DateTime, Utc};
use pricewatch_core::{
    NotificationRecord, PreferenceStore, StoreError, Subscription, Target, UserId,
};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::subscriptions;

/// Preference store backed by the `subscriptions` table.
#[derive(Clone)]
pub struct PgPreferenceStore {
    pool: PgPool,
}

impl PgPreferenceStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl PreferenceStore for PgPreferenceStore {
    async fn list_subscriptions(&self) -> Result<Vec<Subscription>, StoreError> {
        let rows = subscriptions::list_subscriptions(&self.pool).await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let user_id = row.user_id;
            match row.into_subscription() {
                Ok(sub) => out.push(sub),
                Err(e) => tracing::warn!(user_id, error = %e, "skipping invalid subscription row"),
            }
        }
        Ok(out)
    }

    async fn get(&self, user_id: UserId) -> Result<Option<Subscription>, StoreError> {
        subscriptions::get_subscription(&self.pool, user_id)
            .await?
            .map(subscriptions::SubscriptionRow::into_subscription)
            .transpose()
    }

    async fn upsert(
        &self,
        user_id: UserId,
        target: Target,
        threshold: Decimal,
    ) -> Result<Subscription, StoreError> {
        // Validate before touching the table.
        let subscription = Subscription::new(user_id, target, threshold).map_err(|e| {
            StoreError::InvalidRecord {
                user_id,
                reason: e.to_string(),
            }
        })?;
        subscriptions::upsert_subscription(
            &self.pool,
            user_id,
            &subscription.target,
            subscription.threshold,
        )
        .await?;
        Ok(subscription)
    }

    async fn remove(&self, user_id: UserId) -> Result<bool, StoreError> {
        Ok(subscriptions::delete_subscription(&self.pool, user_id).await?)
    }

    async fn record_notification(&self, record: &NotificationRecord) -> Result<(), StoreError> {
        subscriptions::mark_notified(&self.pool, record.user_id, record.notified_at).await?;
        Ok(())
    }

    async fn record_check(
        &self,
        user_id: UserId,
        checked_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        subscriptions::mark_checked(&self.pool, user_id, checked_at).await?;
        Ok(())
    }
}
