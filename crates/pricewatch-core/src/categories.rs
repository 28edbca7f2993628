use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Shape of the upstream response for a category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    /// Catalog JSON API (`data.products[]`).
    #[default]
    Json,
    /// Storefront page with product-card markup.
    Html,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub id: u32,
    pub name: String,
    /// Catalog shard segment of the JSON endpoint, e.g. `"electronic14"`.
    pub shard: String,
    /// Extra query parameter selecting the category, e.g. `"cat=3192"`.
    pub query: String,
    /// Storefront path used for `html` categories, e.g. `"/catalog/elektronika/noutbuki"`.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub format: PayloadFormat,
}

impl CategoryConfig {
    /// Splits `query` into its key and value.
    #[must_use]
    pub fn query_pair(&self) -> Option<(&str, &str)> {
        self.query
            .split_once('=')
            .filter(|(k, v)| !k.trim().is_empty() && !v.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct CategoriesFile {
    pub categories: Vec<CategoryConfig>,
}

/// Validated, read-only set of categories users can pick from.
#[derive(Debug, Clone)]
pub struct CategoryCatalog {
    categories: Vec<CategoryConfig>,
}

impl CategoryCatalog {
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if any record is invalid.
    pub fn new(categories: Vec<CategoryConfig>) -> Result<Self, ConfigError> {
        validate_categories(&categories)?;
        Ok(Self { categories })
    }

    /// The marketplace's main categories, used when no catalog file exists.
    /// Mirrors the shipped `config/categories.yaml`.
    #[must_use]
    pub fn builtin() -> Self {
        let entry = |id: u32, name: &str, shard: &str, path: &str, format: PayloadFormat| {
            CategoryConfig {
                id,
                name: name.to_string(),
                shard: shard.to_string(),
                query: format!("cat={id}"),
                path: Some(path.to_string()),
                format,
            }
        };
        let json = PayloadFormat::Json;
        let html = PayloadFormat::Html;
        Self {
            categories: vec![
                entry(
                    3192,
                    "Ноутбуки и компьютеры",
                    "electronic14",
                    "/catalog/elektronika/noutbuki-pereferiya",
                    json,
                ),
                entry(
                    3281,
                    "Смартфоны и гаджеты",
                    "electronic15",
                    "/catalog/elektronika/smartfony-i-gadzhety",
                    json,
                ),
                entry(617, "Телевизоры", "electronic3", "/catalog/elektronika/televizory", json),
                entry(813, "Красота и здоровье", "beauty1", "/catalog/krasota-i-zdorove", json),
                entry(1680, "Дом и сад", "house1", "/catalog/dom-i-dacha", json),
                entry(907, "Одежда", "women_clothes2", "/catalog/zhenshchinam/odezhda", html),
                entry(908, "Обувь", "shoes1", "/catalog/zhenshchinam/obuv", html),
            ],
        }
    }

    #[must_use]
    pub fn get(&self, id: u32) -> Option<&CategoryConfig> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CategoryConfig> {
        self.categories.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Load and validate the category catalog from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_categories(path: &Path) -> Result<CategoryCatalog, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CategoriesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: CategoriesFile = serde_yaml::from_str(&content)?;
    CategoryCatalog::new(file.categories)
}

/// Like [`load_categories`], but falls back to [`CategoryCatalog::builtin`]
/// when the file does not exist. A present-but-broken file is still an error.
///
/// # Errors
///
/// Returns `ConfigError` if an existing file cannot be read, parsed, or validated.
pub fn load_categories_or_builtin(path: &Path) -> Result<CategoryCatalog, ConfigError> {
    if path.exists() {
        load_categories(path)
    } else {
        Ok(CategoryCatalog::builtin())
    }
}

fn validate_categories(categories: &[CategoryConfig]) -> Result<(), ConfigError> {
    if categories.is_empty() {
        return Err(ConfigError::Validation(
            "at least one category is required".to_string(),
        ));
    }

    let mut seen_ids = HashSet::new();

    for category in categories {
        if category.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "category {} must have a non-empty name",
                category.id
            )));
        }

        if category.shard.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "category '{}' must have a non-empty shard",
                category.name
            )));
        }

        if category.query_pair().is_none() {
            return Err(ConfigError::Validation(format!(
                "category '{}' has invalid query '{}'; expected key=value",
                category.name, category.query
            )));
        }

        if category.format == PayloadFormat::Html
            && !category.path.as_deref().is_some_and(|p| p.starts_with('/'))
        {
            return Err(ConfigError::Validation(format!(
                "html category '{}' needs a path starting with '/'",
                category.name
            )));
        }

        if !seen_ids.insert(category.id) {
            return Err(ConfigError::Validation(format!(
                "duplicate category id: {}",
                category.id
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "categories_test.rs"]
mod tests;
