use std::sync::Arc;
use std::time::Duration;

use pricewatch_core::{AppConfig, PreferenceStore, StoreError};
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;

pub mod file_store;
pub mod pg_store;
pub mod subscriptions;

pub use file_store::JsonFileStore;
pub use pg_store::PgPreferenceStore;
pub use subscriptions::{
    delete_subscription, get_subscription, list_subscriptions, mark_checked, mark_notified,
    upsert_subscription, SubscriptionRow,
};

/// Seconds to wait for a free pooled connection.
const ACQUIRE_TIMEOUT_SECS: u64 = 10;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Store(inner) => inner,
            other => StoreError::Backend(Box::new(other)),
        }
    }
}

/// Opens a pool sized by `PRICEWATCH_DB_MAX_CONNECTIONS` and applies pending
/// migrations.
///
/// # Errors
///
/// Returns [`DbError`] if the database is unreachable or a migration fails.
pub async fn connect_pool(database_url: &str, config: &AppConfig) -> Result<PgPool, DbError> {
    let max_connections = config.db_max_connections.max(1);
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECS))
        .connect(database_url)
        .await?;
    MIGRATOR.run(&pool).await?;
    Ok(pool)
}

/// Opens the configured preference store: Postgres when `DATABASE_URL` is
/// set (migrations applied on open), otherwise one JSON file per user under
/// the data directory.
///
/// # Errors
///
/// Returns [`DbError`] if the database is unreachable, a migration fails, or
/// the data directory cannot be created.
pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn PreferenceStore>, DbError> {
    if let Some(database_url) = config.database_url.as_deref() {
        let pool = connect_pool(database_url, config).await?;
        tracing::info!("preference store: postgres");
        Ok(Arc::new(PgPreferenceStore::new(pool)))
    } else {
        let store = JsonFileStore::open(&config.data_dir).await?;
        tracing::info!(dir = %config.data_dir.display(), "preference store: json files");
        Ok(Arc::new(store))
    }
}
