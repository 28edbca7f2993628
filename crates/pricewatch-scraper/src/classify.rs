//! Response classification.
//!
//! The upstream edge substitutes challenge pages for data without always
//! changing the status, so the body is inspected before the status alone is
//! trusted.

use pricewatch_core::PayloadFormat;
use scraper::Html;
use serde_json::Value;

use crate::extract::{has_cards, has_listing_container, product_array};
use crate::types::{Classification, Payload, RawResponse};

/// Non-standard status the edge uses for anti-bot rejections.
const ANTIBOT_STATUS: u16 = 498;

/// Lowercased substrings seen on challenge interstitials.
const CHALLENGE_MARKERS: &[&str] = &[
    "captcha",
    "challenge-form",
    "cf-challenge",
    "__cf_chl",
    "checking your browser",
    "ddos-guard",
    "antibot",
    "почти готово",
    "подозрительная активность",
];

/// Classifies one upstream response against the format the request expected.
#[must_use]
pub fn classify(raw: &RawResponse) -> Classification {
    if !raw.is_success() {
        if raw.status == ANTIBOT_STATUS || has_challenge_marker(&raw.body) {
            return Classification::Blocked;
        }
        return Classification::ServerError { status: raw.status };
    }

    match raw.expected {
        PayloadFormat::Json => classify_json(raw),
        PayloadFormat::Html => classify_html(&raw.body),
    }
}

fn classify_json(raw: &RawResponse) -> Classification {
    let body: Value = match serde_json::from_str(&raw.body) {
        Ok(body) => body,
        Err(e) => {
            // An HTML document where JSON was requested is an interstitial.
            if looks_like_html(raw) || has_challenge_marker(&raw.body) {
                return Classification::Blocked;
            }
            return Classification::Malformed {
                reason: format!("body is not JSON: {e}"),
            };
        }
    };

    match product_array(body) {
        Some(items) if items.is_empty() => Classification::Empty,
        Some(items) => Classification::Success(Payload::Json(items)),
        None => Classification::Malformed {
            reason: "no product array in JSON body".to_string(),
        },
    }
}

fn classify_html(body: &str) -> Classification {
    let doc = Html::parse_document(body);
    if has_cards(&doc) {
        return Classification::Success(Payload::Html(doc));
    }
    if has_listing_container(&doc) {
        return Classification::Empty;
    }
    if has_challenge_marker(body) {
        return Classification::Blocked;
    }
    Classification::Malformed {
        reason: "page has no product cards or listing container".to_string(),
    }
}

fn looks_like_html(raw: &RawResponse) -> bool {
    let by_header = raw
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("text/html"));
    let head: String = raw
        .body
        .trim_start()
        .chars()
        .take(64)
        .collect::<String>()
        .to_lowercase();
    by_header || head.starts_with("<!doctype html") || head.starts_with("<html")
}

fn has_challenge_marker(body: &str) -> bool {
    let lower = body.to_lowercase();
    CHALLENGE_MARKERS.iter().any(|m| lower.contains(m))
}
