//! CSS selectors for storefront HTML, in priority order per field.
//!
//! Update these lists when the storefront markup changes: add the new class
//! at the front and keep the old ones as fallbacks, with a fixture test.

use std::sync::LazyLock;

use scraper::Selector;

fn parse_all(candidates: &[&str]) -> Vec<Selector> {
    candidates
        .iter()
        .map(|css| Selector::parse(css).expect("selector literal is valid CSS"))
        .collect()
}

/// Product card containers. The first candidate with any match wins.
pub(crate) static CARD: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    parse_all(&["div.product-card", "article.product-card", "[data-nm-id]"])
});

pub(crate) static NAME: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    parse_all(&["span.goods-name", ".product-card__name", ".goods-name"])
});

pub(crate) static SALE_PRICE: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    parse_all(&["ins.price", ".price__lower-price", ".lower-price"])
});

pub(crate) static ORIGINAL_PRICE: LazyLock<Vec<Selector>> =
    LazyLock::new(|| parse_all(&["del", ".price__old-price"]));

pub(crate) static LINK: LazyLock<Vec<Selector>> =
    LazyLock::new(|| parse_all(&["a.product-card__link", "a[href]"]));

pub(crate) static RATING: LazyLock<Vec<Selector>> =
    LazyLock::new(|| parse_all(&[".address-rate-mini", ".product-card__rating"]));

pub(crate) static REVIEWS: LazyLock<Vec<Selector>> =
    LazyLock::new(|| parse_all(&[".product-card__count", ".goods-card__count"]));

/// Listing wrappers present on a real catalog page even when it has no cards.
pub(crate) static LISTING_CONTAINER: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    parse_all(&[
        ".product-card-list",
        ".catalog-page__main",
        "#catalog-content",
    ])
});

/// Attribute carrying the article number on a card.
pub(crate) const NM_ID_ATTR: &str = "data-nm-id";
