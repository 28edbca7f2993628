//! Outbound messages to subscribers.

use pricewatch_core::{NormalizedProduct, UserId};
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    /// The Bot API could not be reached or its reply could not be read.
    #[error("telegram request failed: {0}")]
    Http(#[source] reqwest::Error),

    /// The Bot API answered `ok: false`, e.g. the user blocked the bot.
    #[error("telegram rejected {method}: {description}")]
    Api {
        method: &'static str,
        code: Option<i64>,
        description: String,
    },
}

impl NotifyError {
    /// `true` when the chat is gone or the user blocked the bot.
    #[must_use]
    pub fn is_recipient_gone(&self) -> bool {
        matches!(self, NotifyError::Api { code: Some(403), .. })
    }
}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL embeds the bot token.
        NotifyError::Http(err.without_url())
    }
}

/// Delivery channel for match notifications.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Sends an HTML-formatted message with link previews enabled.
    async fn send(&self, user_id: UserId, html: &str) -> Result<(), NotifyError>;
}

/// Renders a price for display: `48000`, `1499.5`.
#[must_use]
pub fn format_price(price: Decimal) -> String {
    price.normalize().to_string()
}

/// Message announcing the cheapest match of a check.
#[must_use]
pub fn format_match_message(product: &NormalizedProduct) -> String {
    format!("🔥 <b>Цена упала!</b>\n{}", format_product(product))
}

/// Name, price and link of a product as HTML lines.
#[must_use]
pub fn format_product(product: &NormalizedProduct) -> String {
    let mut price_line = format!("💰 {} ₽", format_price(product.price));
    if let (Some(original), Some(percent)) = (product.original_price, product.discount_percent()) {
        price_line.push_str(&format!(" <s>{} ₽</s> −{percent}%", format_price(original)));
    }

    format!(
        "📦 {}\n{price_line}\n🔗 <a href=\"{}\">Смотреть товар</a>",
        html_escape::encode_text(&product.name),
        html_escape::encode_double_quoted_attribute(&product.link),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str, price: i64, original: Option<i64>) -> NormalizedProduct {
        NormalizedProduct {
            id: Some("1".to_string()),
            name: name.to_string(),
            price: Decimal::from(price),
            original_price: original.map(Decimal::from),
            rating: None,
            review_count: None,
            link: "https://www.wildberries.ru/catalog/1/detail.aspx".to_string(),
        }
    }

    #[test]
    fn match_message_carries_name_price_and_link() {
        let text = format_match_message(&product("Laptop A", 48_000, Some(60_000)));
        assert!(text.contains("Laptop A"));
        assert!(text.contains("💰 48000 ₽"));
        assert!(text.contains("<s>60000 ₽</s> −20%"));
        assert!(text.contains(r#"<a href="https://www.wildberries.ru/catalog/1/detail.aspx">"#));
    }

    #[test]
    fn match_message_escapes_markup_in_names() {
        let text = format_match_message(&product("Cable <USB-C> & more", 500, None));
        assert!(text.contains("Cable &lt;USB-C&gt; &amp; more"));
        assert!(!text.contains("<s>"));
    }

    #[test]
    fn format_price_drops_trailing_zeros() {
        assert_eq!(format_price(Decimal::new(149_950, 2)), "1499.5");
        assert_eq!(format_price(Decimal::new(4_800_000, 2)), "48000");
    }
}
