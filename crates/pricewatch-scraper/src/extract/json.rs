use pricewatch_core::NormalizedProduct;
use rust_decimal::Decimal;
use serde_json::Value;

use super::candidates;
use crate::error::ExtractionSkip;
use crate::price::{decode_json_price, PriceUnit};

/// Moves the product array out of a parsed response body.
pub(crate) fn product_array(mut body: Value) -> Option<Vec<Value>> {
    let pointer = candidates::PRODUCTS
        .iter()
        .find(|pointer| body.pointer(pointer).is_some_and(Value::is_array))?;
    match body.pointer_mut(pointer).map(Value::take) {
        Some(Value::Array(items)) => Some(items),
        _ => None,
    }
}

/// Builds the canonical product page link.
pub(crate) fn detail_link(site_url: &str, id: &str) -> String {
    format!("{site_url}/catalog/{id}/detail.aspx")
}

pub(crate) fn normalize_entry(
    entry: &Value,
    index: usize,
    site_url: &str,
) -> Result<NormalizedProduct, ExtractionSkip> {
    let name = first_string(entry, candidates::NAME).ok_or(ExtractionSkip::MissingName { index })?;

    let original_price = first_price(entry, candidates::ORIGINAL_PRICE);
    let price = first_price(entry, candidates::SALE_PRICE)
        .or(original_price)
        .ok_or(ExtractionSkip::MissingPrice { index })?;

    let id = first_present(entry, candidates::ID).and_then(|v| match v {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    });

    let rating = first_present(entry, candidates::RATING)
        .and_then(Value::as_f64)
        .filter(|r| (0.0..=5.0).contains(r));

    let review_count = first_present(entry, candidates::REVIEWS)
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok());

    let link = id.as_deref().map_or_else(
        || site_url.to_string(),
        |id| detail_link(site_url, id),
    );

    Ok(NormalizedProduct {
        id,
        name,
        price,
        original_price,
        rating,
        review_count,
        link,
    })
}

fn first_present<'v>(entry: &'v Value, pointers: &[&str]) -> Option<&'v Value> {
    pointers
        .iter()
        .filter_map(|pointer| entry.pointer(pointer))
        .find(|v| !v.is_null())
}

fn first_string(entry: &Value, pointers: &[&str]) -> Option<String> {
    pointers.iter().find_map(|pointer| {
        entry
            .pointer(pointer)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

/// First candidate that decodes to a positive price. Zero means "not set"
/// upstream, so it falls through to the next candidate.
fn first_price(entry: &Value, fields: &[(&str, PriceUnit)]) -> Option<Decimal> {
    fields.iter().find_map(|(pointer, unit)| {
        entry
            .pointer(pointer)
            .and_then(|v| decode_json_price(v, *unit))
    })
}
