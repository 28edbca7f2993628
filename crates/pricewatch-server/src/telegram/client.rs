use std::time::Duration;

use pricewatch_core::UserId;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};

use super::types::{
    AnswerCallbackQuery, ApiResponse, DeleteWebhook, GetUpdates, InlineKeyboardMarkup,
    LinkPreviewOptions, Message, SendMessage, SetWebhook, Update,
};
use crate::notify::{NotifyError, Notifier};

const ALLOWED_UPDATES: &[&str] = &["message", "callback_query"];

/// Minimal Bot API client over HTTPS.
pub struct TelegramClient {
    client: Client,
    /// `{api_url}/bot{token}`; never logged.
    endpoint: String,
    request_timeout: Duration,
}

impl TelegramClient {
    /// # Errors
    ///
    /// Returns [`NotifyError::Http`] if the HTTP client cannot be built.
    pub fn new(api_url: &str, token: &str, timeout_secs: u64) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/bot{token}", api_url.trim_end_matches('/')),
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    async fn call<P, R>(
        &self,
        method: &'static str,
        params: &P,
        timeout: Duration,
    ) -> Result<R, NotifyError>
    where
        P: Serialize + Sync,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}/{method}", self.endpoint))
            .timeout(timeout)
            .json(params)
            .send()
            .await?;

        // Rejections come back as non-2xx with the same JSON envelope.
        let envelope: ApiResponse<R> = response.json().await?;
        match envelope {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse {
                description,
                error_code,
                ..
            } => Err(NotifyError::Api {
                method,
                code: error_code,
                description: description.unwrap_or_else(|| "no description".to_string()),
            }),
        }
    }

    /// Sends an HTML message, optionally with an inline keyboard.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] if the request fails or Telegram rejects it.
    pub async fn send_message(
        &self,
        chat_id: i64,
        html: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<Message, NotifyError> {
        let params = SendMessage {
            chat_id,
            text: html,
            parse_mode: "HTML",
            link_preview_options: LinkPreviewOptions { is_disabled: false },
            reply_markup: keyboard,
        };
        self.call("sendMessage", &params, self.request_timeout)
            .await
    }

    /// Long-polls for updates. The HTTP timeout is stretched past `wait_secs`
    /// so an idle poll is not reported as a failure.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] if the request fails or Telegram rejects it.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        wait_secs: u64,
    ) -> Result<Vec<Update>, NotifyError> {
        let params = GetUpdates {
            offset,
            timeout: wait_secs,
            allowed_updates: ALLOWED_UPDATES,
        };
        let timeout = self.request_timeout + Duration::from_secs(wait_secs);
        self.call("getUpdates", &params, timeout).await
    }

    /// # Errors
    ///
    /// Returns [`NotifyError`] if the request fails or Telegram rejects it.
    pub async fn set_webhook(&self, url: &str, secret: Option<&str>) -> Result<(), NotifyError> {
        let params = SetWebhook {
            url,
            secret_token: secret,
            allowed_updates: ALLOWED_UPDATES,
        };
        let _: bool = self.call("setWebhook", &params, self.request_timeout).await?;
        Ok(())
    }

    /// Removes any webhook so `getUpdates` can be used.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] if the request fails or Telegram rejects it.
    pub async fn delete_webhook(&self) -> Result<(), NotifyError> {
        let params = DeleteWebhook {
            drop_pending_updates: false,
        };
        let _: bool = self
            .call("deleteWebhook", &params, self.request_timeout)
            .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`NotifyError`] if the request fails or Telegram rejects it.
    pub async fn answer_callback_query(&self, callback_query_id: &str) -> Result<(), NotifyError> {
        let params = AnswerCallbackQuery { callback_query_id };
        let _: bool = self
            .call("answerCallbackQuery", &params, self.request_timeout)
            .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramClient {
    async fn send(&self, user_id: UserId, html: &str) -> Result<(), NotifyError> {
        self.send_message(user_id, html, None).await.map(|_| ())
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
