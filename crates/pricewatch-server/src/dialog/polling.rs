use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use super::{Dispatcher, Reply};
use crate::telegram::{TelegramClient, Update};

/// Seconds Telegram holds an idle `getUpdates` call open.
const LONG_POLL_SECS: u64 = 30;
const ERROR_PAUSE: Duration = Duration::from_secs(5);
/// Webhook updates buffered ahead of the worker before senders wait.
const WEBHOOK_QUEUE: usize = 256;

/// Sends `reply`, acknowledging its callback query first. Failures are
/// logged; the dialog has no one else to report them to.
async fn deliver(bot: &TelegramClient, reply: Reply) {
    if let Some(callback_id) = reply.callback_id.as_deref() {
        if let Err(e) = bot.answer_callback_query(callback_id).await {
            tracing::debug!(chat_id = reply.chat_id, error = %e, "failed to answer callback query");
        }
    }
    if let Err(e) = bot
        .send_message(reply.chat_id, &reply.text, reply.keyboard.as_ref())
        .await
    {
        tracing::warn!(chat_id = reply.chat_id, error = %e, "failed to send reply");
    }
}

/// Long-polling loop. Runs until the task is aborted.
///
/// Updates are handled one at a time so a chat's messages are applied to
/// its dialog state in order.
pub async fn run_polling(bot: Arc<TelegramClient>, dispatcher: Arc<Dispatcher>) {
    if let Err(e) = bot.delete_webhook().await {
        tracing::warn!(error = %e, "failed to clear webhook before polling");
    }
    tracing::info!("telegram: long polling started");

    let mut offset = None;
    loop {
        let updates = match bot.get_updates(offset, LONG_POLL_SECS).await {
            Ok(updates) => updates,
            Err(e) => {
                tracing::warn!(error = %e, "telegram: getUpdates failed");
                tokio::time::sleep(ERROR_PAUSE).await;
                continue;
            }
        };

        for update in updates {
            offset = Some(update.update_id + 1);
            if let Some(reply) = dispatcher.handle_update(update).await {
                deliver(&bot, reply).await;
            }
        }
    }
}

/// Starts the worker that answers webhook updates one at a time, in arrival
/// order, so the same ordering holds as with polling. The worker stops once
/// every sender is dropped.
pub fn spawn_update_worker(
    bot: Arc<TelegramClient>,
    dispatcher: Arc<Dispatcher>,
) -> mpsc::Sender<Update> {
    let (tx, mut rx) = mpsc::channel::<Update>(WEBHOOK_QUEUE);
    tokio::spawn(async move {
        while let Some(update) = rx.recv().await {
            if let Some(reply) = dispatcher.handle_update(update).await {
                deliver(&bot, reply).await;
            }
        }
        tracing::debug!("telegram: webhook update worker stopped");
    });
    tx
}
