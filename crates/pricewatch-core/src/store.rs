//! Boundary to wherever subscriptions are persisted.
//!
//! The watch cycle only reads subscriptions and appends notification
//! records; the dialog layer is the only writer of subscriptions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::products::NotificationRecord;
use crate::subscriptions::{Subscription, Target, UserId};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error for {context}: {source}")]
    Serialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid stored record for user {user_id}: {reason}")]
    InvalidRecord { user_id: UserId, reason: String },

    #[error("storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

#[async_trait::async_trait]
pub trait PreferenceStore: Send + Sync {
    /// All active subscriptions, in a stable order.
    async fn list_subscriptions(&self) -> Result<Vec<Subscription>, StoreError>;

    async fn get(&self, user_id: UserId) -> Result<Option<Subscription>, StoreError>;

    /// Creates or replaces the user's single subscription.
    async fn upsert(
        &self,
        user_id: UserId,
        target: Target,
        threshold: Decimal,
    ) -> Result<Subscription, StoreError>;

    /// Removes the user's subscription. Returns `false` if there was none.
    async fn remove(&self, user_id: UserId) -> Result<bool, StoreError>;

    async fn record_notification(&self, record: &NotificationRecord) -> Result<(), StoreError>;

    /// Stamps the time of the user's last completed check. Stores without a
    /// place for it keep the default no-op.
    async fn record_check(
        &self,
        _user_id: UserId,
        _checked_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        Ok(())
    }
}
