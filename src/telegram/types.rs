//! Bot API wire types and their mapping onto bot events
//!
//! Only the fields the bot reads are modelled; serde ignores the rest.

use crate::menu::{Keyboard, MenuCode, Reply, TextFormat};
use crate::runtime::{InboundEvent, Origin};
use crate::state_machine::{Command, Event};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

/// Used in the greeting when the sender has no usable first name
pub const DEFAULT_DISPLAY_NAME: &str = "путник";

/// Envelope of every Bot API response
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseParameters {
    #[serde(default)]
    pub retry_after: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
    /// Only presence matters; palm photos are not downloaded
    #[serde(default)]
    pub photo: Option<IgnoredAny>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    #[serde(default)]
    pub first_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<String>,
}

impl Update {
    /// Map an update onto a conversation event.
    ///
    /// `None` for update kinds the bot does not handle, and for button taps
    /// that carry no message (inline mode), which have no chat to answer in.
    pub fn into_inbound(self) -> Option<InboundEvent> {
        if let Some(query) = self.callback_query {
            return query.into_inbound();
        }
        self.message.map(Message::into_inbound)
    }

    /// Callback id to answer when the update cannot be routed
    pub fn orphan_callback_id(&self) -> Option<&str> {
        self.callback_query
            .as_ref()
            .filter(|q| q.message.is_none())
            .map(|q| q.id.as_str())
    }
}

impl CallbackQuery {
    fn into_inbound(self) -> Option<InboundEvent> {
        let message = self.message?;
        let data = self.data.unwrap_or_default();
        let event = match data.parse::<MenuCode>() {
            Ok(code) => Event::Menu(code),
            Err(_) => Event::UnknownMenu(data),
        };
        Some(InboundEvent {
            conversation_id: message.chat.id,
            origin: Origin::Callback {
                message_id: message.message_id,
                callback_id: self.id,
            },
            event,
        })
    }
}

impl Message {
    fn into_inbound(self) -> InboundEvent {
        let event = match (self.text, self.photo) {
            (Some(text), _) if text.starts_with('/') => {
                command_event(&text, self.from.as_ref())
            }
            (Some(text), _) => Event::Text(text),
            (None, Some(_)) => Event::Photo,
            (None, None) => Event::Unsupported,
        };
        InboundEvent {
            conversation_id: self.chat.id,
            origin: Origin::Message,
            event,
        }
    }
}

fn command_event(text: &str, from: Option<&User>) -> Event {
    let command = text.split_whitespace().next().unwrap_or_default();
    // Group chats address commands as `/start@BotName`
    let command = command.split('@').next().unwrap_or_default();
    match command {
        "/start" => Event::Command(Command::Start {
            display_name: display_name(from),
        }),
        "/help" => Event::Command(Command::Help),
        _ => Event::Unsupported,
    }
}

fn display_name(from: Option<&User>) -> String {
    from.map(|u| u.first_name.trim())
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_DISPLAY_NAME)
        .to_string()
}

// ============================================================================
// Outbound
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

impl From<&Keyboard> for InlineKeyboardMarkup {
    fn from(keyboard: &Keyboard) -> Self {
        Self {
            inline_keyboard: keyboard
                .rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|button| InlineKeyboardButton {
                            text: button.label.to_string(),
                            callback_data: button.code.as_str().to_string(),
                        })
                        .collect()
                })
                .collect(),
        }
    }
}

/// `sendMessage` parameters
#[derive(Debug, Serialize)]
pub struct SendMessage<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

/// `editMessageText` parameters
#[derive(Debug, Serialize)]
pub struct EditMessageText<'a> {
    pub chat_id: i64,
    pub message_id: i64,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

#[derive(Debug, Serialize)]
pub struct AnswerCallbackQuery<'a> {
    pub callback_query_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct GetUpdates {
    pub offset: i64,
    pub timeout: u64,
    pub allowed_updates: &'static [&'static str],
}

/// Telegram's name for a reply's text format
pub fn parse_mode(reply: &Reply) -> Option<&'static str> {
    match reply.format {
        TextFormat::Plain => None,
        TextFormat::Markdown => Some("Markdown"),
    }
}
