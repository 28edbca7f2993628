use pricewatch_core::{AppConfig, CategoryConfig, PayloadFormat};
use reqwest::Url;

use crate::error::ScraperError;

/// Query parameters shared by the catalog and search endpoints.
const COMMON_PARAMS: &[(&str, &str)] = &[
    ("appType", "1"),
    ("curr", "rub"),
    ("dest", "-1257786"),
];

const SORT_PARAMS: &[(&str, &str)] = &[("sort", "popular"), ("spp", "30")];

/// Base URLs of the three upstream surfaces, without trailing slashes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketplaceUrls {
    /// Storefront: HTML category pages and canonical product links.
    pub site: String,
    /// Catalog JSON API.
    pub catalog: String,
    /// Search JSON API.
    pub search: String,
}

impl MarketplaceUrls {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            site: config.marketplace_site_url.clone(),
            catalog: config.marketplace_catalog_url.clone(),
            search: config.marketplace_search_url.clone(),
        }
    }

    /// Request URL and payload format for a category.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrl`] if the configured base cannot be
    /// combined into a valid URL.
    pub fn category_url(
        &self,
        category: &CategoryConfig,
    ) -> Result<(Url, PayloadFormat), ScraperError> {
        let (key, value) = category.query_pair().ok_or_else(|| ScraperError::InvalidUrl {
            url: category.query.clone(),
            reason: "category query must be key=value".to_string(),
        })?;

        match category.format {
            PayloadFormat::Json => {
                let mut url = parse(&format!(
                    "{}/catalog/{}/v2/catalog",
                    self.catalog, category.shard
                ))?;
                url.query_pairs_mut()
                    .extend_pairs(COMMON_PARAMS)
                    .extend_pairs(SORT_PARAMS)
                    .append_pair(key, value);
                Ok((url, PayloadFormat::Json))
            }
            PayloadFormat::Html => {
                let path = category.path.as_deref().unwrap_or_default();
                let mut url = parse(&format!("{}{path}", self.site))?;
                url.query_pairs_mut().append_pair(key, value);
                Ok((url, PayloadFormat::Html))
            }
        }
    }

    /// Search endpoint URL for a free-text query.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrl`] if the configured base is invalid.
    pub fn search_url(&self, text: &str) -> Result<Url, ScraperError> {
        let mut url = parse(&format!("{}/exactmatch/ru/common/v4/search", self.search))?;
        url.query_pairs_mut()
            .extend_pairs(COMMON_PARAMS)
            .append_pair("resultset", "catalog")
            .extend_pairs(SORT_PARAMS)
            .append_pair("query", text);
        Ok(url)
    }

    /// `Referer` sent with every request: the storefront root.
    #[must_use]
    pub fn referer(&self) -> String {
        format!("{}/", self.site)
    }
}

fn parse(raw: &str) -> Result<Url, ScraperError> {
    Url::parse(raw).map_err(|e| ScraperError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}
