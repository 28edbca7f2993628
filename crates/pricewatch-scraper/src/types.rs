//! Wire-level types passed between the adapter, classifier and extractor.
//!
//! ## Observed upstream behavior
//!
//! ### Catalog and search JSON
//! Both endpoints answer `{"data": {"products": [...]}}`. Older search
//! responses put `products` at the top level. Prices come as `priceU` and
//! `salePriceU` in kopecks; newer payloads drop those and carry
//! `sizes[0].price.basic` / `sizes[0].price.product` instead, also in kopecks.
//!
//! ### Anti-bot interstitial
//! Under load the edge answers the JSON endpoints with `200 text/html` and a
//! "Почти готово..." page, or with status 498. Neither carries products.
//!
//! ### Storefront HTML
//! Product cards are `div.product-card` (older `article.product-card`), each
//! with a `data-nm-id` attribute, `ins.price` for the sale price and
//! `span.goods-name` for the title. Class names drift between releases.

use pricewatch_core::PayloadFormat;
use scraper::Html;
use serde_json::Value;

/// One upstream exchange, unmodified. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
    /// `Content-Type` header value, if the upstream sent one.
    pub content_type: Option<String>,
    /// The payload shape the request asked for.
    pub expected: PayloadFormat,
}

impl RawResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A parsed success payload.
///
/// `Html` holds a parsed document, which is not `Send`; keep it out of
/// anything that lives across an `.await`.
#[derive(Debug)]
pub enum Payload {
    /// Raw product entries in source order.
    Json(Vec<Value>),
    Html(Html),
}

#[derive(Debug)]
pub enum Classification {
    Success(Payload),
    /// Well-formed response with zero product entries.
    Empty,
    /// Anti-bot challenge instead of data.
    Blocked,
    /// Non-2xx without a challenge fingerprint.
    ServerError { status: u16 },
    /// Neither data nor a recognizable challenge.
    Malformed { reason: String },
}

impl Classification {
    /// Short label for logs and reports.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Classification::Success(_) => "success",
            Classification::Empty => "empty",
            Classification::Blocked => "blocked",
            Classification::ServerError { .. } => "server_error",
            Classification::Malformed { .. } => "malformed",
        }
    }
}
