//! Product extraction from classified payloads.
//!
//! Extraction is lazy: entries are normalized as the iterator is pulled.
//! Calling [`extract`] again on the same payload starts over and yields the
//! same sequence.

mod candidates;
mod html;
mod json;

use std::iter::{Enumerate, Take};
use std::slice;

use pricewatch_core::NormalizedProduct;
use serde_json::Value;

use crate::error::ExtractionSkip;
use crate::types::Payload;

pub(crate) use html::{has_cards, has_listing_container};
pub(crate) use json::product_array;

/// Per-fetch extraction settings.
#[derive(Debug, Clone)]
pub struct ExtractContext {
    /// Site root used for canonical links, without a trailing slash.
    pub site_url: String,
    /// Raw entries examined per payload; later entries are ignored.
    pub max_entries: usize,
}

enum Entries<'a> {
    Json(Enumerate<Take<slice::Iter<'a, Value>>>),
    Html(Enumerate<Take<html::Cards<'a>>>),
}

/// Normalized products of one payload, in source order.
pub struct Products<'a> {
    entries: Entries<'a>,
    site_url: &'a str,
}

impl Iterator for Products<'_> {
    type Item = NormalizedProduct;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let result: Result<NormalizedProduct, ExtractionSkip> = match &mut self.entries {
                Entries::Json(iter) => {
                    let (index, entry) = iter.next()?;
                    json::normalize_entry(entry, index, self.site_url)
                }
                Entries::Html(iter) => {
                    let (index, card) = iter.next()?;
                    html::normalize_card(card, index, self.site_url)
                }
            };
            match result {
                Ok(product) => return Some(product),
                Err(skip) => tracing::debug!(reason = %skip, "extract: skipping entry"),
            }
        }
    }
}

/// Starts extraction over `payload`, examining at most `ctx.max_entries`
/// raw entries. Entries missing a name or a price are dropped.
#[must_use]
pub fn extract<'a>(payload: &'a Payload, ctx: &'a ExtractContext) -> Products<'a> {
    let entries = match payload {
        Payload::Json(items) => Entries::Json(items.iter().take(ctx.max_entries).enumerate()),
        Payload::Html(doc) => {
            Entries::Html(html::Cards::new(doc).take(ctx.max_entries).enumerate())
        }
    };
    Products {
        entries,
        site_url: &ctx.site_url,
    }
}

#[cfg(test)]
#[path = "../extract_test.rs"]
mod tests;
