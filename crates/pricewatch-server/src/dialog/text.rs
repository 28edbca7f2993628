//! User-facing texts. All of them are sent with HTML parse mode.

use std::time::Duration;

use pricewatch_core::{CategoryCatalog, NormalizedProduct, Target};
use rust_decimal::Decimal;

use crate::notify::{format_price, format_product};

pub const WELCOME: &str =
    "Привет! Я помогу тебе отслеживать цены на Wildberries.\nВыбери категорию:";

pub const HELP: &str = "Я слежу за ценами на Wildberries и пишу, когда находится товар дешевле заданной цены.\n\n\
/start — выбрать категорию\n\
/search &lt;запрос&gt; — следить за поисковым запросом\n\
/status — текущая подписка\n\
/check — проверить прямо сейчас\n\
/stop — отменить подписку";

pub const UNKNOWN_CATEGORY: &str = "Ошибка: категория не найдена.";
pub const PICK_CATEGORY_FIRST: &str = "Выберите категорию кнопкой выше или начните заново: /start";
pub const SEARCH_USAGE: &str = "Укажите запрос, например: /search ноутбук";
pub const INVALID_PRICE: &str = "Введите корректное число больше 0.";
pub const NO_SUBSCRIPTION: &str = "У вас нет активной подписки. Начните с /start.";
pub const UNSUBSCRIBED: &str = "Подписка отменена. Вернуться можно через /start.";
pub const STORE_FAILED: &str = "Не удалось обратиться к хранилищу, попробуйте позже.";

pub const CHECK_EMPTY: &str = "Ничего не найдено.";
pub const CHECK_BLOCKED: &str = "Ничего не найдено.\n\
<i>Маркетплейс ответил проверкой на робота вместо списка товаров, поэтому результат может быть неполным. \
Попробуйте позже.</i>";
pub const CHECK_MALFORMED: &str = "Не удалось разобрать ответ маркетплейса, попробуйте позже.";
pub const CHECK_NETWORK: &str = "Не удалось связаться с маркетплейсом, попробуйте позже.";
pub const CHECK_INVALID_TARGET: &str =
    "Эту подписку больше нельзя проверить. Выберите новую через /start.";

pub fn category_chosen(name: &str) -> String {
    format!(
        "✅ Выбрана категория: <b>{}</b>\nВведите максимальную цену (в рублях):",
        html_escape::encode_text(name)
    )
}

pub fn query_chosen(query: &str) -> String {
    format!(
        "🔎 Запрос: <b>{}</b>\nВведите максимальную цену (в рублях):",
        html_escape::encode_text(query)
    )
}

/// `10 мин.` for whole minutes, `45 сек.` otherwise.
fn describe_interval(interval: Duration) -> String {
    let secs = interval.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        format!("{} мин.", secs / 60)
    } else {
        format!("{secs} сек.")
    }
}

pub fn subscribed(threshold: Decimal, interval: Duration) -> String {
    format!(
        "🎯 Отлично! Я буду присылать уведомления, если цена упадёт ниже <b>{} ₽</b>.\n\
         Проверяю каждые {}",
        format_price(threshold),
        describe_interval(interval)
    )
}

pub fn describe_target(target: &Target, catalog: &CategoryCatalog) -> String {
    match target {
        Target::Category(id) => match catalog.get(*id) {
            Some(category) => format!(
                "категория <b>{}</b>",
                html_escape::encode_text(&category.name)
            ),
            None => format!("категория #{id}"),
        },
        Target::Query(query) => format!("поиск <b>{}</b>", html_escape::encode_text(query)),
    }
}

pub fn status(target: &str, threshold: Decimal) -> String {
    format!(
        "Вы отслеживаете: {target}\nМаксимальная цена: <b>{} ₽</b>",
        format_price(threshold)
    )
}

pub fn check_found(best: &NormalizedProduct, threshold: Decimal, total: usize) -> String {
    format!(
        "✅ Есть товары дешевле {} ₽: {total}\nСамый дешёвый:\n{}",
        format_price(threshold),
        format_product(best)
    )
}

pub fn check_nothing_below(threshold: Decimal, extracted: usize) -> String {
    format!(
        "Сейчас нет товаров дешевле {} ₽ (просмотрено: {extracted}).",
        format_price(threshold)
    )
}

pub fn check_server_error(status: u16) -> String {
    format!("Маркетплейс временно недоступен (код {status}), попробуйте позже.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_in_minutes_or_seconds() {
        assert_eq!(describe_interval(Duration::from_secs(600)), "10 мин.");
        assert_eq!(describe_interval(Duration::from_secs(90)), "90 сек.");
        assert_eq!(describe_interval(Duration::from_secs(30)), "30 сек.");
    }

    #[test]
    fn user_text_is_escaped() {
        assert_eq!(
            query_chosen("<script>"),
            "🔎 Запрос: <b>&lt;script&gt;</b>\nВведите максимальную цену (в рублях):"
        );
        assert_eq!(
            describe_target(&Target::Query("a&b".to_string()), &CategoryCatalog::builtin()),
            "поиск <b>a&amp;b</b>"
        );
    }

    #[test]
    fn unknown_category_falls_back_to_id() {
        assert_eq!(
            describe_target(&Target::Category(1), &CategoryCatalog::builtin()),
            "категория #1"
        );
    }
}
