//! Ordered JSON field candidates. The first pointer that yields a usable
//! value wins; later entries are names the API used in earlier releases.

use crate::price::PriceUnit;

/// Where the product array lives in a catalog or search response.
pub(crate) const PRODUCTS: &[&str] = &["/data/products", "/products"];

pub(crate) const ID: &[&str] = &["/id", "/nmId", "/nm_id"];

pub(crate) const NAME: &[&str] = &["/name", "/imt_name", "/title"];

pub(crate) const SALE_PRICE: &[(&str, PriceUnit)] = &[
    ("/salePriceU", PriceUnit::Minor),
    ("/sizes/0/price/product", PriceUnit::Minor),
    ("/salePrice", PriceUnit::Major),
];

pub(crate) const ORIGINAL_PRICE: &[(&str, PriceUnit)] = &[
    ("/priceU", PriceUnit::Minor),
    ("/sizes/0/price/basic", PriceUnit::Minor),
    ("/price", PriceUnit::Major),
];

pub(crate) const RATING: &[&str] = &["/reviewRating", "/nmReviewRating", "/rating"];

pub(crate) const REVIEWS: &[&str] = &["/feedbacks", "/nmFeedbacks"];
