//! Telegram Bot API transport
//!
//! Long-polls `getUpdates`, maps updates onto conversation events and renders
//! replies back as messages with inline keyboards.

mod client;
mod poller;
mod sink;
mod types;

pub use client::TelegramClient;
pub use poller::run_polling;
pub use sink::TelegramSink;

use crate::menu::Reply;
use async_trait::async_trait;
use thiserror::Error;

/// Outbound message calls; the sink talks to Telegram only through these
#[async_trait]
pub trait MessageApi: Send + Sync {
    async fn send_message(&self, chat_id: i64, reply: &Reply) -> Result<(), TelegramError>;

    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        reply: &Reply,
    ) -> Result<(), TelegramError>;

    /// Stop the client's loading spinner on a tapped button
    async fn answer_callback_query(&self, callback_id: &str) -> Result<(), TelegramError>;
}

#[derive(Debug, Error)]
pub enum TelegramError {
    /// Transport failure; the URL (which contains the token) is stripped
    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),

    #[error("Telegram API error {code}: {description}")]
    Api {
        code: i64,
        description: String,
        retry_after: Option<u64>,
    },

    #[error("malformed Telegram response: {0}")]
    Malformed(String),
}

impl TelegramError {
    pub(crate) fn http(error: reqwest::Error) -> Self {
        TelegramError::Http(error.without_url())
    }

    /// Editing a message to identical content
    pub fn is_not_modified(&self) -> bool {
        matches!(self, TelegramError::Api { description, .. }
            if description.contains("message is not modified"))
    }

    /// Telegram rejected the Markdown entities in the text
    pub fn is_parse_error(&self) -> bool {
        matches!(self, TelegramError::Api { code: 400, description, .. }
            if description.contains("can't parse entities"))
    }

    /// The target message can no longer be edited (deleted, too old)
    pub fn is_uneditable(&self) -> bool {
        matches!(self, TelegramError::Api { code: 400, description, .. }
            if description.contains("message to edit not found")
                || description.contains("message can't be edited"))
    }

    /// Suggested wait before retrying, for flood-control errors
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            TelegramError::Api { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}
