//! Subscriptions: who watches what, and below which price.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Chat/user identifier on the messaging platform.
pub type UserId = i64;

/// What a subscription watches on the marketplace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Target {
    /// A catalog category, resolved through the category catalog.
    Category(u32),
    /// A free-text search query.
    Query(String),
}

impl Target {
    /// Builds a query target, trimming whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyQuery`] when the query is blank.
    pub fn query(text: &str) -> Result<Self, CoreError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(CoreError::EmptyQuery);
        }
        Ok(Target::Query(trimmed.to_string()))
    }

    /// Storage discriminator: `"category"` or `"query"`.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Target::Category(_) => "category",
            Target::Query(_) => "query",
        }
    }

    /// Storage value: the category id or the query text.
    #[must_use]
    pub fn value(&self) -> String {
        match self {
            Target::Category(id) => id.to_string(),
            Target::Query(text) => text.clone(),
        }
    }

    /// Rebuilds a target from its storage columns.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTarget`] for an unknown kind or a
    /// non-numeric category id.
    pub fn from_parts(kind: &str, value: &str) -> Result<Self, CoreError> {
        match kind {
            "category" => value
                .trim()
                .parse::<u32>()
                .map(Target::Category)
                .map_err(|_| CoreError::InvalidTarget(format!("{kind}:{value}"))),
            "query" => Target::query(value),
            _ => Err(CoreError::InvalidTarget(format!("{kind}:{value}"))),
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind(), self.value())
    }
}

impl FromStr for Target {
    type Err = CoreError;

    /// Parses `category:<id>` or `query:<text>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, value) = s
            .split_once(':')
            .ok_or_else(|| CoreError::InvalidTarget(s.to_string()))?;
        Target::from_parts(kind.trim(), value)
    }
}

/// One active subscription per user; the last write wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub user_id: UserId,
    pub target: Target,
    /// Maximum price in major currency units. Always positive.
    pub threshold: Decimal,
}

impl Subscription {
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidThreshold`] when `threshold` is not positive.
    pub fn new(user_id: UserId, target: Target, threshold: Decimal) -> Result<Self, CoreError> {
        if threshold <= Decimal::ZERO {
            return Err(CoreError::InvalidThreshold(threshold.to_string()));
        }
        Ok(Self {
            user_id,
            target,
            threshold,
        })
    }
}

/// Parses a user-typed price such as `"50000"`, `"49 999,50"` or `"1500 ₽"`.
///
/// # Errors
///
/// Returns [`CoreError::InvalidThreshold`] unless the input is a positive decimal.
pub fn parse_threshold(input: &str) -> Result<Decimal, CoreError> {
    let cleaned: String = input
        .trim()
        .trim_end_matches('₽')
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    let value = Decimal::from_str(&cleaned)
        .map_err(|_| CoreError::InvalidThreshold(input.trim().to_string()))?;
    if value <= Decimal::ZERO {
        return Err(CoreError::InvalidThreshold(input.trim().to_string()));
    }
    Ok(value.normalize())
}
