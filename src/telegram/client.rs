//! Minimal Bot API client over reqwest

use super::types::{
    AnswerCallbackQuery, ApiResponse, EditMessageText, GetUpdates, InlineKeyboardMarkup,
    SendMessage, Update, User,
};
use super::{MessageApi, TelegramError};
use crate::config::TelegramConfig;
use crate::menu::Reply;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

const API_BASE_URL: &str = "https://api.telegram.org";

/// Updates the bot subscribes to
const ALLOWED_UPDATES: &[&str] = &["message", "callback_query"];

/// Headroom over the long-poll timeout before the HTTP client gives up
const POLL_GRACE: Duration = Duration::from_secs(10);

pub struct TelegramClient {
    client: Client,
    /// `{base}/bot{token}`; never logged
    method_base: String,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> Result<Self, TelegramError> {
        Self::with_base_url(config, API_BASE_URL)
    }

    pub fn with_base_url(config: &TelegramConfig, base_url: &str) -> Result<Self, TelegramError> {
        let client = Client::builder()
            .timeout(config.poll_timeout + POLL_GRACE)
            .build()
            .map_err(TelegramError::http)?;

        Ok(Self {
            client,
            method_base: format!("{}/bot{}", base_url.trim_end_matches('/'), config.bot_token),
        })
    }

    async fn call<P, R>(&self, method: &str, params: &P) -> Result<R, TelegramError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}/{method}", self.method_base))
            .json(params)
            .send()
            .await
            .map_err(TelegramError::http)?;

        // Telegram reports API errors with a JSON body on non-2xx statuses
        let body = response.text().await.map_err(TelegramError::http)?;
        let envelope: ApiResponse<R> = serde_json::from_str(&body)
            .map_err(|e| TelegramError::Malformed(format!("{method}: {e}")))?;

        Self::unwrap_envelope(method, envelope)
    }

    fn unwrap_envelope<R>(method: &str, envelope: ApiResponse<R>) -> Result<R, TelegramError> {
        if !envelope.ok {
            return Err(TelegramError::Api {
                code: envelope.error_code.unwrap_or_default(),
                description: envelope
                    .description
                    .unwrap_or_else(|| format!("{method} failed")),
                retry_after: envelope.parameters.and_then(|p| p.retry_after),
            });
        }
        envelope
            .result
            .ok_or_else(|| TelegramError::Malformed(format!("{method}: ok without result")))
    }

    /// Check the token; returns the bot's own user
    pub async fn get_me(&self) -> Result<User, TelegramError> {
        self.call("getMe", &serde_json::json!({})).await
    }

    /// Long-poll for updates with id `>= offset`
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout: Duration,
    ) -> Result<Vec<Update>, TelegramError> {
        let params = GetUpdates {
            offset,
            timeout: timeout.as_secs(),
            allowed_updates: ALLOWED_UPDATES,
        };
        self.call("getUpdates", &params).await
    }
}

#[async_trait]
impl MessageApi for TelegramClient {
    async fn send_message(&self, chat_id: i64, reply: &Reply) -> Result<(), TelegramError> {
        let params = SendMessage {
            chat_id,
            text: &reply.text,
            parse_mode: super::types::parse_mode(reply),
            reply_markup: reply.keyboard.as_ref().map(InlineKeyboardMarkup::from),
        };
        self.call::<_, serde_json::Value>("sendMessage", &params)
            .await
            .map(drop)
    }

    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        reply: &Reply,
    ) -> Result<(), TelegramError> {
        let params = EditMessageText {
            chat_id,
            message_id,
            text: &reply.text,
            parse_mode: super::types::parse_mode(reply),
            reply_markup: reply.keyboard.as_ref().map(InlineKeyboardMarkup::from),
        };
        self.call::<_, serde_json::Value>("editMessageText", &params)
            .await
            .map(drop)
    }

    async fn answer_callback_query(&self, callback_id: &str) -> Result<(), TelegramError> {
        let params = AnswerCallbackQuery {
            callback_query_id: callback_id,
        };
        self.call::<_, bool>("answerCallbackQuery", &params)
            .await
            .map(drop)
    }
}
