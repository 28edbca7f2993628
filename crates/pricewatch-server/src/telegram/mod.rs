//! Telegram Bot API transport.

mod client;
pub mod types;

pub use client::TelegramClient;
pub use types::{CallbackQuery, InlineKeyboardButton, InlineKeyboardMarkup, Update};
