//! The synchronous tail of the pipeline: classify, extract, evaluate.
//!
//! Kept free of `.await` so the parsed HTML document never has to be `Send`.

use pricewatch_core::{evaluate, MatchResult};
use rust_decimal::Decimal;

use crate::classify::classify;
use crate::extract::{extract, ExtractContext};
use crate::types::{Classification, RawResponse};

/// Result of checking one response against one threshold.
#[derive(Debug, Clone, PartialEq)]
pub enum Scan {
    /// Products were extracted; `matches` may still be empty.
    Checked {
        matches: MatchResult,
        /// Products that survived extraction.
        extracted: usize,
    },
    Empty,
    Blocked,
    ServerError { status: u16 },
    Malformed { reason: String },
}

impl Scan {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Scan::Checked { .. } => "checked",
            Scan::Empty => "empty",
            Scan::Blocked => "blocked",
            Scan::ServerError { .. } => "server_error",
            Scan::Malformed { .. } => "malformed",
        }
    }
}

/// Runs classification, extraction and threshold evaluation on `raw`.
#[must_use]
pub fn scan(raw: &RawResponse, threshold: Decimal, ctx: &ExtractContext) -> Scan {
    match classify(raw) {
        Classification::Success(payload) => {
            let products: Vec<_> = extract(&payload, ctx).collect();
            let extracted = products.len();
            Scan::Checked {
                matches: evaluate(products, threshold),
                extracted,
            }
        }
        Classification::Empty => Scan::Empty,
        Classification::Blocked => Scan::Blocked,
        Classification::ServerError { status } => Scan::ServerError { status },
        Classification::Malformed { reason } => Scan::Malformed { reason },
    }
}
