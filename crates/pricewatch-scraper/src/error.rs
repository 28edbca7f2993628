use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    /// Connection failure, timeout, or a body that could not be read.
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid marketplace URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("unknown category id {0}")]
    UnknownCategory(u32),
}

impl ScraperError {
    /// `true` for failures of the exchange itself, as opposed to a bad request.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, ScraperError::Http(_))
    }
}

/// Why a single listing entry was dropped during extraction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionSkip {
    #[error("entry {index} has no name")]
    MissingName { index: usize },

    #[error("entry {index} has no usable price")]
    MissingPrice { index: usize },
}
