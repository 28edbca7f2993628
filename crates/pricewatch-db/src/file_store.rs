//! Preference store with one JSON document per user.
//!
//! Files are named `<user_id>.json`. Writes go to a temporary sibling and
//! are renamed into place, so a reader never sees a half-written document.
//! Documents written by the first bot generation
//! (`{"category_id": .., "max_price": ..}`) are still read.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use pricewatch_core::{
    NotificationRecord, PreferenceStore, StoreError, Subscription, Target, UserId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserDocument {
    user_id: UserId,
    target: Target,
    threshold: Decimal,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    last_checked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    last_notified_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct LegacyDocument {
    category_id: Option<u32>,
    max_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredDocument {
    Current(UserDocument),
    Legacy(LegacyDocument),
}

pub struct JsonFileStore {
    dir: PathBuf,
    /// Serializes read-modify-write cycles across tasks.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Opens the store, creating `dir` if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| io_error(&dir, e))?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, user_id: UserId) -> PathBuf {
        self.dir.join(format!("{user_id}.json"))
    }

    async fn read_document(&self, user_id: UserId) -> Result<Option<UserDocument>, StoreError> {
        let path = self.path_for(user_id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(&path, e)),
        };
        parse_document(user_id, &bytes)
    }

    async fn write_document(&self, doc: &UserDocument) -> Result<(), StoreError> {
        let path = self.path_for(doc.user_id);
        let tmp = self
            .dir
            .join(format!(".{}.{}.tmp", doc.user_id, uuid::Uuid::new_v4()));
        let bytes = serde_json::to_vec_pretty(doc).map_err(|e| StoreError::Serialize {
            context: format!("subscription of user {}", doc.user_id),
            source: e,
        })?;

        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| io_error(&tmp, e))?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(io_error(&path, e));
        }
        Ok(())
    }

    /// Applies `update` to the stored document, if any, and writes it back.
    async fn update_document<F>(&self, user_id: UserId, update: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut UserDocument) + Send,
    {
        let _guard = self.write_lock.lock().await;
        let Some(mut doc) = self.read_document(user_id).await? else {
            return Ok(());
        };
        update(&mut doc);
        self.write_document(&doc).await
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Parses a stored document. Legacy documents without both fields are
/// half-finished dialogs and read as "no subscription".
fn parse_document(user_id: UserId, bytes: &[u8]) -> Result<Option<UserDocument>, StoreError> {
    let stored: StoredDocument =
        serde_json::from_slice(bytes).map_err(|e| StoreError::Serialize {
            context: format!("{user_id}.json"),
            source: e,
        })?;

    match stored {
        StoredDocument::Current(doc) => {
            if doc.user_id != user_id {
                return Err(StoreError::InvalidRecord {
                    user_id,
                    reason: format!("file belongs to user {}", doc.user_id),
                });
            }
            Ok(Some(doc))
        }
        StoredDocument::Legacy(LegacyDocument {
            category_id: Some(category_id),
            max_price: Some(max_price),
        }) => {
            let threshold =
                Decimal::try_from(max_price).map_err(|e| StoreError::InvalidRecord {
                    user_id,
                    reason: format!("max_price {max_price}: {e}"),
                })?;
            Ok(Some(UserDocument {
                user_id,
                target: Target::Category(category_id),
                threshold: threshold.normalize(),
                created_at: None,
                updated_at: None,
                last_checked_at: None,
                last_notified_at: None,
            }))
        }
        StoredDocument::Legacy(_) => Ok(None),
    }
}

fn to_subscription(doc: UserDocument) -> Result<Subscription, StoreError> {
    let user_id = doc.user_id;
    Subscription::new(user_id, doc.target, doc.threshold).map_err(|e| StoreError::InvalidRecord {
        user_id,
        reason: e.to_string(),
    })
}

/// User id encoded in a `<user_id>.json` file name.
fn user_id_from_path(path: &Path) -> Option<UserId> {
    if path.extension()? != "json" {
        return None;
    }
    path.file_stem()?.to_str()?.parse().ok()
}

#[async_trait::async_trait]
impl PreferenceStore for JsonFileStore {
    async fn list_subscriptions(&self) -> Result<Vec<Subscription>, StoreError> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| io_error(&self.dir, e))?;

        let mut user_ids = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_error(&self.dir, e))?
        {
            if let Some(user_id) = user_id_from_path(&entry.path()) {
                user_ids.push(user_id);
            }
        }
        user_ids.sort_unstable();

        let mut subscriptions = Vec::with_capacity(user_ids.len());
        for user_id in user_ids {
            let result = self
                .read_document(user_id)
                .await
                .and_then(|doc| doc.map(to_subscription).transpose());
            match result {
                Ok(Some(sub)) => subscriptions.push(sub),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(user_id, error = %e, "skipping unreadable subscription file");
                }
            }
        }
        Ok(subscriptions)
    }

    async fn get(&self, user_id: UserId) -> Result<Option<Subscription>, StoreError> {
        self.read_document(user_id)
            .await?
            .map(to_subscription)
            .transpose()
    }

    async fn upsert(
        &self,
        user_id: UserId,
        target: Target,
        threshold: Decimal,
    ) -> Result<Subscription, StoreError> {
        let subscription = Subscription::new(user_id, target, threshold).map_err(|e| {
            StoreError::InvalidRecord {
                user_id,
                reason: e.to_string(),
            }
        })?;

        let _guard = self.write_lock.lock().await;
        // An unreadable previous file is replaced rather than blocking the user.
        let previous = self.read_document(user_id).await.ok().flatten();
        let now = Utc::now();
        let doc = UserDocument {
            user_id,
            target: subscription.target.clone(),
            threshold: subscription.threshold,
            created_at: previous.as_ref().and_then(|d| d.created_at).or(Some(now)),
            updated_at: Some(now),
            last_checked_at: previous.as_ref().and_then(|d| d.last_checked_at),
            last_notified_at: previous.as_ref().and_then(|d| d.last_notified_at),
        };
        self.write_document(&doc).await?;
        Ok(subscription)
    }

    async fn remove(&self, user_id: UserId) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        let path = self.path_for(user_id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(&path, e)),
        }
    }

    async fn record_notification(&self, record: &NotificationRecord) -> Result<(), StoreError> {
        let at = record.notified_at;
        self.update_document(record.user_id, move |doc| {
            doc.last_notified_at = Some(at);
            doc.last_checked_at = doc.last_checked_at.max(Some(at));
        })
        .await
    }

    async fn record_check(
        &self,
        user_id: UserId,
        checked_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.update_document(user_id, move |doc| {
            doc.last_checked_at = doc.last_checked_at.max(Some(checked_at));
        })
        .await
    }
}
