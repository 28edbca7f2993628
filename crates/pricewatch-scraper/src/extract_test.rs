use pricewatch_core::PayloadFormat;
use rust_decimal::Decimal;
use serde_json::json;

use super::*;
use crate::classify::classify;
use crate::types::{Classification, RawResponse};

fn ctx(max_entries: usize) -> ExtractContext {
    ExtractContext {
        site_url: "https://www.wildberries.ru".to_string(),
        max_entries,
    }
}

fn json_payload(products: &serde_json::Value) -> Payload {
    let entries = products.as_array().expect("fixture is an array").clone();
    Payload::Json(entries)
}

fn html_payload(body: &str) -> Payload {
    let raw = RawResponse {
        status: 200,
        body: body.to_string(),
        content_type: Some("text/html".to_string()),
        expected: PayloadFormat::Html,
    };
    match classify(&raw) {
        Classification::Success(payload) => payload,
        other => panic!("fixture should classify as success, got {other:?}"),
    }
}

#[test]
fn json_extraction_keeps_source_order() {
    let payload = json_payload(&json!([
        {"id": 1, "name": "Laptop A", "priceU": 6_000_000, "salePriceU": 4_800_000},
        {"id": 2, "name": "Laptop B", "priceU": 5_500_000, "salePriceU": 5_500_000},
    ]));
    let ctx = ctx(20);
    let products: Vec<_> = extract(&payload, &ctx).collect();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0].name, "Laptop A");
    assert_eq!(products[0].price, Decimal::from(48_000));
    assert_eq!(products[1].price, Decimal::from(55_000));
}

#[test]
fn extraction_is_repeatable() {
    let payload = json_payload(&json!([
        {"id": 1, "name": "a", "priceU": 100},
        {"id": 2, "priceU": 200},
        {"id": 3, "name": "c", "salePriceU": 300},
    ]));
    let ctx = ctx(20);
    let first: Vec<_> = extract(&payload, &ctx).collect();
    let second: Vec<_> = extract(&payload, &ctx).collect();
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
}

#[test]
fn invalid_entries_are_skipped_without_failing_the_batch() {
    let payload = json_payload(&json!([
        {"id": 1},
        "not an object",
        null,
        {"id": 4, "name": "ok", "priceU": 12_345},
    ]));
    let ctx = ctx(20);
    let products: Vec<_> = extract(&payload, &ctx).collect();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].price, Decimal::from(123));
}

#[test]
fn cap_applies_to_raw_entries() {
    let entries: Vec<_> = (0..30)
        .map(|i| json!({"id": i, "name": format!("p{i}"), "priceU": 10_000}))
        .collect();
    let payload = Payload::Json(entries);
    assert_eq!(extract(&payload, &ctx(20)).count(), 20);

    // A skipped entry inside the window is not replaced by one past it.
    let mut entries: Vec<_> = (0..5)
        .map(|i| json!({"id": i, "name": format!("p{i}"), "priceU": 10_000}))
        .collect();
    entries[1] = json!({"id": 1});
    let payload = Payload::Json(entries);
    assert_eq!(extract(&payload, &ctx(3)).count(), 2);
}

#[test]
fn zero_cap_yields_nothing() {
    let payload = json_payload(&json!([{"id": 1, "name": "a", "priceU": 100}]));
    assert_eq!(extract(&payload, &ctx(0)).count(), 0);
}

#[test]
fn html_extraction_reads_cards() {
    let payload = html_payload(
        r#"<html><body><div class="product-card-list">
             <div class="product-card" data-nm-id="11">
               <span class="goods-name">Smart TV 43</span>
               <ins class="price">24 990 ₽</ins><del>31 990 ₽</del>
             </div>
             <div class="product-card" data-nm-id="12">
               <span class="goods-name">Broken card</span>
             </div>
             <div class="product-card" data-nm-id="13">
               <span class="goods-name">Smart TV 50</span>
               <ins class="price">29 990 ₽</ins>
             </div>
           </div></body></html>"#,
    );
    let ctx = ctx(20);
    let products: Vec<_> = extract(&payload, &ctx).collect();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0].id.as_deref(), Some("11"));
    assert_eq!(
        products[0].link,
        "https://www.wildberries.ru/catalog/11/detail.aspx"
    );
    assert_eq!(products[1].price, Decimal::from(29_990));

    let again: Vec<_> = extract(&payload, &ctx).collect();
    assert_eq!(products, again);
}

#[test]
fn html_cap_applies_to_cards() {
    let cards: String = (0..15)
        .map(|i| {
            let rubles = (i + 1) * 100;
            format!(
                r#"<div class="product-card"><span class="goods-name">p{i}</span><ins class="price">{rubles} ₽</ins></div>"#
            )
        })
        .collect();
    let payload = html_payload(&format!("<html><body>{cards}</body></html>"));
    assert_eq!(extract(&payload, &ctx(10)).count(), 10);
}
