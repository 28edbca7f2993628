//! Conversational front end: pick a target, enter a price, manage the
//! subscription.
//!
//! Each chat has an explicit [`DialogState`] owned by the [`Dispatcher`].
//! Handlers compute a [`Reply`]; the transport decides how to deliver it.

mod polling;
mod text;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use pricewatch_core::{parse_threshold, CategoryCatalog, PreferenceStore, Target, UserId};
use pricewatch_scraper::Scan;

use crate::telegram::{CallbackQuery, InlineKeyboardButton, InlineKeyboardMarkup, Update};
use crate::watch::Orchestrator;

pub use polling::{run_polling, spawn_update_worker};

const CATEGORY_CALLBACK_PREFIX: &str = "cat_";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DialogState {
    #[default]
    Idle,
    AwaitingCategory,
    AwaitingPrice(Target),
}

/// Outgoing answer to one update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub chat_id: i64,
    pub text: String,
    pub keyboard: Option<InlineKeyboardMarkup>,
    /// Callback query to acknowledge before sending `text`.
    pub callback_id: Option<String>,
}

impl Reply {
    fn plain(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            keyboard: None,
            callback_id: None,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Start,
    Search(&'a str),
    Status,
    Stop,
    Check,
    Help,
}

/// Parses `/cmd args` and `/cmd@botname args`. `None` for plain text.
fn parse_command(input: &str) -> Option<Command<'_>> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;
    let (head, args) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    let name = head.split('@').next().unwrap_or(head);
    Some(match name {
        "start" => Command::Start,
        "search" => Command::Search(args.trim()),
        "status" => Command::Status,
        "stop" => Command::Stop,
        "check" => Command::Check,
        _ => Command::Help,
    })
}

pub struct Dispatcher {
    store: Arc<dyn PreferenceStore>,
    catalog: Arc<CategoryCatalog>,
    checker: Arc<Orchestrator>,
    check_interval: Duration,
    sessions: Mutex<HashMap<i64, DialogState>>,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn PreferenceStore>,
        catalog: Arc<CategoryCatalog>,
        checker: Arc<Orchestrator>,
        check_interval: Duration,
    ) -> Self {
        Self {
            store,
            catalog,
            checker,
            check_interval,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn state(&self, chat_id: i64) -> DialogState {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&chat_id)
            .cloned()
            .unwrap_or_default()
    }

    fn set_state(&self, chat_id: i64, state: DialogState) {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        if state == DialogState::Idle {
            sessions.remove(&chat_id);
        } else {
            sessions.insert(chat_id, state);
        }
    }

    /// Handles one update. `None` when there is nothing to answer.
    pub async fn handle_update(&self, update: Update) -> Option<Reply> {
        if let Some(callback) = update.callback_query {
            return Some(self.handle_callback(callback));
        }
        let message = update.message?;
        let text = message.text?;
        Some(self.handle_text(message.chat.id, &text).await)
    }

    fn handle_callback(&self, callback: CallbackQuery) -> Reply {
        let chat_id = callback
            .message
            .as_ref()
            .map_or(callback.from.id, |m| m.chat.id);
        let category = callback
            .data
            .as_deref()
            .and_then(|d| d.strip_prefix(CATEGORY_CALLBACK_PREFIX))
            .and_then(|id| id.parse::<u32>().ok())
            .and_then(|id| self.catalog.get(id));

        let mut reply = match category {
            Some(category) => {
                self.set_state(chat_id, DialogState::AwaitingPrice(Target::Category(category.id)));
                Reply::plain(chat_id, text::category_chosen(&category.name))
            }
            None => {
                tracing::debug!(chat_id, data = ?callback.data, "unknown callback");
                Reply::plain(chat_id, text::UNKNOWN_CATEGORY)
            }
        };
        reply.callback_id = Some(callback.id);
        reply
    }

    async fn handle_text(&self, chat_id: i64, input: &str) -> Reply {
        match parse_command(input) {
            Some(Command::Start) => self.start(chat_id),
            Some(Command::Search(query)) => self.search(chat_id, query),
            Some(Command::Status) => self.status(chat_id).await,
            Some(Command::Stop) => self.stop(chat_id).await,
            Some(Command::Check) => self.check(chat_id).await,
            Some(Command::Help) => Reply::plain(chat_id, text::HELP),
            None => match self.state(chat_id) {
                DialogState::AwaitingPrice(target) => {
                    self.accept_price(chat_id, target, input).await
                }
                DialogState::AwaitingCategory => Reply::plain(chat_id, text::PICK_CATEGORY_FIRST),
                DialogState::Idle => Reply::plain(chat_id, text::HELP),
            },
        }
    }

    fn start(&self, chat_id: i64) -> Reply {
        self.set_state(chat_id, DialogState::AwaitingCategory);
        Reply {
            keyboard: Some(self.category_keyboard()),
            ..Reply::plain(chat_id, text::WELCOME)
        }
    }

    fn category_keyboard(&self) -> InlineKeyboardMarkup {
        InlineKeyboardMarkup {
            inline_keyboard: self
                .catalog
                .iter()
                .map(|category| {
                    vec![InlineKeyboardButton {
                        text: category.name.clone(),
                        callback_data: format!("{CATEGORY_CALLBACK_PREFIX}{}", category.id),
                    }]
                })
                .collect(),
        }
    }

    fn search(&self, chat_id: i64, query: &str) -> Reply {
        match Target::query(query) {
            Ok(target) => {
                let reply = text::query_chosen(query.trim());
                self.set_state(chat_id, DialogState::AwaitingPrice(target));
                Reply::plain(chat_id, reply)
            }
            Err(_) => Reply::plain(chat_id, text::SEARCH_USAGE),
        }
    }

    async fn accept_price(&self, chat_id: UserId, target: Target, input: &str) -> Reply {
        let Ok(threshold) = parse_threshold(input) else {
            return Reply::plain(chat_id, text::INVALID_PRICE);
        };
        match self.store.upsert(chat_id, target, threshold).await {
            Ok(subscription) => {
                self.set_state(chat_id, DialogState::Idle);
                tracing::info!(
                    user_id = chat_id,
                    target = %subscription.target,
                    threshold = %subscription.threshold,
                    "subscription saved"
                );
                Reply::plain(
                    chat_id,
                    text::subscribed(subscription.threshold, self.check_interval),
                )
            }
            Err(e) => {
                tracing::error!(user_id = chat_id, error = %e, "failed to save subscription");
                Reply::plain(chat_id, text::STORE_FAILED)
            }
        }
    }

    async fn status(&self, chat_id: UserId) -> Reply {
        match self.store.get(chat_id).await {
            Ok(Some(sub)) => Reply::plain(
                chat_id,
                text::status(&text::describe_target(&sub.target, &self.catalog), sub.threshold),
            ),
            Ok(None) => Reply::plain(chat_id, text::NO_SUBSCRIPTION),
            Err(e) => {
                tracing::error!(user_id = chat_id, error = %e, "failed to read subscription");
                Reply::plain(chat_id, text::STORE_FAILED)
            }
        }
    }

    async fn stop(&self, chat_id: UserId) -> Reply {
        self.set_state(chat_id, DialogState::Idle);
        match self.store.remove(chat_id).await {
            Ok(true) => {
                tracing::info!(user_id = chat_id, "subscription removed");
                Reply::plain(chat_id, text::UNSUBSCRIBED)
            }
            Ok(false) => Reply::plain(chat_id, text::NO_SUBSCRIPTION),
            Err(e) => {
                tracing::error!(user_id = chat_id, error = %e, "failed to remove subscription");
                Reply::plain(chat_id, text::STORE_FAILED)
            }
        }
    }

    /// Runs the pipeline once for this user without the notification gate.
    async fn check(&self, chat_id: UserId) -> Reply {
        let sub = match self.store.get(chat_id).await {
            Ok(Some(sub)) => sub,
            Ok(None) => return Reply::plain(chat_id, text::NO_SUBSCRIPTION),
            Err(e) => {
                tracing::error!(user_id = chat_id, error = %e, "failed to read subscription");
                return Reply::plain(chat_id, text::STORE_FAILED);
            }
        };

        let body = match self.checker.check_target(&sub.target, sub.threshold).await {
            Ok(Scan::Checked { matches, extracted }) => match matches.best() {
                Some(best) => text::check_found(best, sub.threshold, matches.len()),
                None => text::check_nothing_below(sub.threshold, extracted),
            },
            Ok(Scan::Empty) => text::CHECK_EMPTY.to_string(),
            Ok(Scan::Blocked) => text::CHECK_BLOCKED.to_string(),
            Ok(Scan::ServerError { status }) => text::check_server_error(status),
            Ok(Scan::Malformed { reason }) => {
                tracing::warn!(user_id = chat_id, reason = %reason, "interactive check: malformed payload");
                text::CHECK_MALFORMED.to_string()
            }
            Err(e) if e.is_network() => {
                tracing::warn!(user_id = chat_id, error = %e, "interactive check: fetch failed");
                text::CHECK_NETWORK.to_string()
            }
            Err(e) => {
                tracing::error!(user_id = chat_id, error = %e, "interactive check: bad target");
                text::CHECK_INVALID_TARGET.to_string()
            }
        };
        Reply::plain(chat_id, body)
    }
}

#[cfg(test)]
#[path = "../dialog_test.rs"]
mod tests;
