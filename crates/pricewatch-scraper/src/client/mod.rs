//! HTTP source adapter for the marketplace catalog, search and storefront.

mod urls;

use std::sync::Arc;
use std::time::Duration;

use pricewatch_core::{AppConfig, CategoryCatalog, PayloadFormat, Target};
use reqwest::header::{HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, CONTENT_TYPE, ORIGIN, REFERER};
use reqwest::{Client, Url};

use crate::error::ScraperError;
use crate::rate_limit::retry_with_backoff;
use crate::types::RawResponse;

pub use urls::MarketplaceUrls;

const ACCEPT_JSON: &str = "application/json, text/plain, */*";
const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Fetches the raw upstream response for a subscription target.
///
/// Implementations return non-2xx responses as data; only a failed exchange
/// is an error.
#[async_trait::async_trait]
pub trait ListingSource: Send + Sync {
    async fn fetch(&self, target: &Target) -> Result<RawResponse, ScraperError>;
}

/// Marketplace client with a browser-like header set and bounded retry on
/// network failures.
pub struct MarketplaceClient {
    client: Client,
    urls: MarketplaceUrls,
    catalog: Arc<CategoryCatalog>,
    /// Extra attempts after the first network failure.
    max_retries: u32,
    /// Base delay for exponential back-off, in milliseconds.
    backoff_base_ms: u64,
}

impl MarketplaceClient {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
        urls: MarketplaceUrls,
        catalog: Arc<CategoryCatalog>,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            urls,
            catalog,
            max_retries,
            backoff_base_ms,
        })
    }

    /// Builds a client from the scraper and marketplace settings of `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn from_config(
        config: &AppConfig,
        catalog: Arc<CategoryCatalog>,
    ) -> Result<Self, ScraperError> {
        Self::new(
            config.scraper_request_timeout_secs,
            &config.scraper_user_agent,
            config.scraper_max_retries,
            config.scraper_retry_backoff_base_ms,
            MarketplaceUrls::from_config(config),
            catalog,
        )
    }

    #[must_use]
    pub fn urls(&self) -> &MarketplaceUrls {
        &self.urls
    }

    /// Resolves a target to its request URL and expected payload format.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::UnknownCategory`] if the category is not in the catalog.
    /// - [`ScraperError::InvalidUrl`] if the configured bases are unusable.
    pub fn request_for(&self, target: &Target) -> Result<(Url, PayloadFormat), ScraperError> {
        match target {
            Target::Category(id) => {
                let category = self
                    .catalog
                    .get(*id)
                    .ok_or(ScraperError::UnknownCategory(*id))?;
                self.urls.category_url(category)
            }
            Target::Query(text) => Ok((self.urls.search_url(text)?, PayloadFormat::Json)),
        }
    }

    async fn get(&self, url: &Url, expected: PayloadFormat) -> Result<RawResponse, ScraperError> {
        let accept = match expected {
            PayloadFormat::Json => ACCEPT_JSON,
            PayloadFormat::Html => ACCEPT_HTML,
        };
        let referer = self.urls.referer();

        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let mut request = self
                .client
                .get(url.clone())
                .header(ACCEPT, accept)
                .header(ACCEPT_LANGUAGE, "ru-RU,ru;q=0.9,en-US;q=0.8,en;q=0.7")
                .header(REFERER, &referer)
                .header(CACHE_CONTROL, "no-cache");
            if expected == PayloadFormat::Json {
                request = request.header(ORIGIN, &self.urls.site);
            }

            async move {
                let response = request.send().await?;
                let status = response.status().as_u16();
                let content_type = response
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|v: &HeaderValue| v.to_str().ok())
                    .map(str::to_owned);
                let body = response.text().await?;

                Ok(RawResponse {
                    status,
                    body,
                    content_type,
                    expected,
                })
            }
        })
        .await
    }
}

#[async_trait::async_trait]
impl ListingSource for MarketplaceClient {
    async fn fetch(&self, target: &Target) -> Result<RawResponse, ScraperError> {
        let (url, expected) = self.request_for(target)?;
        let raw = self.get(&url, expected).await?;
        tracing::debug!(
            %target,
            status = raw.status,
            bytes = raw.body.len(),
            "marketplace fetch complete"
        );
        Ok(raw)
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
