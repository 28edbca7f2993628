use std::sync::LazyLock;

use pricewatch_core::NormalizedProduct;
use regex::Regex;
use scraper::html::Select;
use scraper::{ElementRef, Html, Selector};

use super::json::detail_link;
use crate::error::ExtractionSkip;
use crate::price::parse_price_text;
use crate::selectors;

static DETAIL_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/catalog/(\d+)/").expect("regex literal is valid"));

/// Product cards of a storefront page, using the first card selector that
/// matches anything.
pub(crate) struct Cards<'a> {
    select: Option<Select<'a, 'static>>,
}

impl<'a> Cards<'a> {
    pub(crate) fn new(doc: &'a Html) -> Self {
        let selector = selectors::CARD
            .iter()
            .find(|s| doc.select(s).next().is_some());
        Self {
            select: selector.map(|s| doc.select(s)),
        }
    }
}

impl<'a> Iterator for Cards<'a> {
    type Item = ElementRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.select.as_mut()?.next()
    }
}

pub(crate) fn has_cards(doc: &Html) -> bool {
    Cards::new(doc).next().is_some()
}

pub(crate) fn has_listing_container(doc: &Html) -> bool {
    selectors::LISTING_CONTAINER
        .iter()
        .any(|s| doc.select(s).next().is_some())
}

pub(crate) fn normalize_card(
    card: ElementRef<'_>,
    index: usize,
    site_url: &str,
) -> Result<NormalizedProduct, ExtractionSkip> {
    let name = first_text(card, &selectors::NAME).ok_or(ExtractionSkip::MissingName { index })?;

    let original_price =
        first_text(card, &selectors::ORIGINAL_PRICE).and_then(|t| parse_price_text(&t));
    let price = first_text(card, &selectors::SALE_PRICE)
        .and_then(|t| parse_price_text(&t))
        .filter(|p| !p.is_zero())
        .or(original_price)
        .ok_or(ExtractionSkip::MissingPrice { index })?;

    let href = selectors::LINK
        .iter()
        .find_map(|s| card.select(s).find_map(|a| a.value().attr("href")))
        .map(str::trim)
        .filter(|h| !h.is_empty());

    let id = card
        .value()
        .attr(selectors::NM_ID_ATTR)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| {
            href.and_then(|h| DETAIL_ID.captures(h))
                .map(|caps| caps[1].to_string())
        });

    let link = match (href, id.as_deref()) {
        (Some(h), _) => resolve_href(site_url, h),
        (None, Some(id)) => detail_link(site_url, id),
        (None, None) => site_url.to_string(),
    };

    let rating = first_text(card, &selectors::RATING)
        .and_then(|t| t.replace(',', ".").parse::<f64>().ok())
        .filter(|r| (0.0..=5.0).contains(r));

    let review_count = first_text(card, &selectors::REVIEWS).and_then(|t| {
        let digits: String = t.chars().filter(char::is_ascii_digit).collect();
        digits.parse::<u32>().ok()
    });

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

/// Text of the first candidate with non-blank content, whitespace collapsed.
fn first_text(card: ElementRef<'_>, candidates: &[Selector]) -> Option<String> {
    candidates.iter().find_map(|s| {
        card.select(s).find_map(|el| {
            let text = el.text().collect::<Vec<_>>().join(" ");
            let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
            (!collapsed.is_empty()).then_some(collapsed)
        })
    })
}

fn resolve_href(site_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if let Some(rest) = href.strip_prefix("//") {
        format!("https://{rest}")
    } else if href.starts_with('/') {
        format!("{site_url}{href}")
    } else {
        format!("{site_url}/{href}")
    }
}
