//! Renders replies as Telegram messages

use super::{MessageApi, TelegramClient, TelegramError};
use crate::menu::{Reply, TextFormat};
use crate::runtime::{Origin, ReplySink, ReplyTarget};
use async_trait::async_trait;
use std::sync::Arc;

/// UTF-16 code units per message; Telegram's hard limit is 4096
const MESSAGE_LIMIT: usize = 4000;

pub struct TelegramSink<A = TelegramClient> {
    api: Arc<A>,
}

impl<A: MessageApi> TelegramSink<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    /// Send or edit, retrying as plain text if the Markdown is rejected
    async fn send(
        &self,
        chat_id: i64,
        edit: Option<i64>,
        reply: &Reply,
    ) -> Result<(), TelegramError> {
        match self.send_once(chat_id, edit, reply).await {
            Err(e) if e.is_parse_error() && reply.format == TextFormat::Markdown => {
                tracing::warn!(chat_id, error = %e, "Markdown rejected, resending as plain text");
                let plain = Reply {
                    format: TextFormat::Plain,
                    ..reply.clone()
                };
                self.send_once(chat_id, edit, &plain).await
            }
            other => other,
        }
    }

    async fn send_once(
        &self,
        chat_id: i64,
        edit: Option<i64>,
        reply: &Reply,
    ) -> Result<(), TelegramError> {
        let Some(message_id) = edit else {
            return self.api.send_message(chat_id, reply).await;
        };
        match self.api.edit_message_text(chat_id, message_id, reply).await {
            Err(e) if e.is_not_modified() => Ok(()),
            Err(e) if e.is_uneditable() => {
                tracing::debug!(chat_id, message_id, "Message not editable, sending a new one");
                self.api.send_message(chat_id, reply).await
            }
            other => other,
        }
    }
}

#[async_trait]
impl<A: MessageApi + 'static> ReplySink for TelegramSink<A> {
    async fn deliver(&self, target: &ReplyTarget, reply: &Reply) -> Result<(), String> {
        let chunks = split_message(&reply.text, MESSAGE_LIMIT);
        let last = chunks.len() - 1;
        let mut edit = match &target.origin {
            Origin::Message => None,
            Origin::Callback { message_id, .. } => Some(*message_id),
        };

        for (i, text) in chunks.into_iter().enumerate() {
            let part = Reply {
                text,
                // The keyboard belongs under the final part
                keyboard: if i == last { reply.keyboard.clone() } else { None },
                format: reply.format,
            };
            // Only the first part can replace the tapped message
            self.send(target.chat_id, edit.take(), &part)
                .await
                .map_err(|e| e.to_string())?;
        }
        Ok(())
    }

    async fn acknowledge(&self, origin: &Origin) -> Result<(), String> {
        match origin {
            Origin::Message => Ok(()),
            Origin::Callback { callback_id, .. } => self
                .api
                .answer_callback_query(callback_id)
                .await
                .map_err(|e| e.to_string()),
        }
    }
}

fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Split text into parts of at most `limit` UTF-16 units, preferring line
/// breaks and never cutting inside a char. Always returns at least one part.
fn split_message(text: &str, limit: usize) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let line_len = utf16_len(line);
        if current_len + line_len > limit && !current.is_empty() {
            parts.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if line_len <= limit {
            current.push_str(line);
            current_len += line_len;
            continue;
        }

        for c in line.chars() {
            let c_len = c.len_utf16();
            if current_len + c_len > limit {
                parts.push(std::mem::take(&mut current));
                current_len = 0;
            }
            current.push(c);
            current_len += c_len;
        }
    }
    parts.push(current);

    let parts: Vec<String> = parts
        .into_iter()
        .map(|p| p.trim_end().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    if parts.is_empty() {
        vec![text.to_string()]
    } else {
        parts
    }
}
