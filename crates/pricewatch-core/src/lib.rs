pub mod app_config;
pub mod categories;
pub mod config;
pub mod evaluate;
pub mod products;
pub mod store;
pub mod subscriptions;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use categories::{
    load_categories, load_categories_or_builtin, CategoryCatalog, CategoryConfig, PayloadFormat,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use evaluate::evaluate;
pub use products::{MatchResult, NormalizedProduct, NotificationRecord};
pub use store::{PreferenceStore, StoreError};
pub use subscriptions::{parse_threshold, Subscription, Target, UserId};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read categories file {path}: {source}")]
    CategoriesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse categories file: {0}")]
    CategoriesFileParse(#[from] serde_yaml::Error),

    #[error("categories validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("threshold must be a positive number, got \"{0}\"")]
    InvalidThreshold(String),

    #[error("search query must be non-empty")]
    EmptyQuery,

    #[error("invalid target \"{0}\"")]
    InvalidTarget(String),
}
