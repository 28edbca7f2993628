use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::subscriptions::UserId;

/// A marketplace listing normalized from either the JSON API or a storefront
/// HTML card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedProduct {
    /// Marketplace article number, when the source exposes one.
    pub id: Option<String>,
    pub name: String,
    /// Comparison price in major currency units. Never negative.
    pub price: Decimal,
    /// Pre-discount price in major units, if the source reports one.
    pub original_price: Option<Decimal>,
    /// Average rating in `0.0..=5.0`.
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    /// Canonical product page, e.g. `"https://www.wildberries.ru/catalog/1/detail.aspx"`.
    pub link: String,
}

impl NormalizedProduct {
    /// Percentage saved relative to `original_price`, rounded down.
    #[must_use]
    pub fn discount_percent(&self) -> Option<u32> {
        let original = self.original_price?;
        if original <= Decimal::ZERO || self.price >= original {
            return None;
        }
        let saved = (original - self.price) * Decimal::from(100) / original;
        saved.trunc().to_u32()
    }
}

/// Products at or below a threshold, cheapest first. Ties keep source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchResult {
    products: Vec<NormalizedProduct>,
}

impl MatchResult {
    /// Wraps products that are already filtered and ordered.
    pub(crate) fn from_sorted(products: Vec<NormalizedProduct>) -> Self {
        Self { products }
    }

    /// The cheapest match, which is the only one a user is notified about.
    #[must_use]
    pub fn best(&self) -> Option<&NormalizedProduct> {
        self.products.first()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NormalizedProduct> {
        self.products.iter()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<NormalizedProduct> {
        self.products
    }
}

impl<'a> IntoIterator for &'a MatchResult {
    type Item = &'a NormalizedProduct;
    type IntoIter = std::slice::Iter<'a, NormalizedProduct>;

    fn into_iter(self) -> Self::IntoIter {
        self.products.iter()
    }
}

/// Written only after a notification was delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub user_id: UserId,
    pub notified_at: DateTime<Utc>,
}
