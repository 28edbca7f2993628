pub mod classify;
pub mod client;
pub mod error;
pub mod extract;
pub mod price;
mod rate_limit;
pub mod scan;
mod selectors;
pub mod types;

pub use classify::classify;
pub use client::{ListingSource, MarketplaceClient, MarketplaceUrls};
pub use error::{ExtractionSkip, ScraperError};
pub use extract::{extract, ExtractContext, Products};
pub use scan::{scan, Scan};
pub use types::{Classification, Payload, RawResponse};
