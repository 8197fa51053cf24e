//! Events that can occur in a conversation

use crate::menu::MenuCode;

/// Slash commands the bot understands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/start`; restarts the conversation
    Start { display_name: String },
    /// `/help`
    Help,
}

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Command(Command),

    /// A button press with a known code
    Menu(MenuCode),

    /// A button press whose callback data matches no code
    UnknownMenu(String),

    /// Free-form text
    Text(String),

    /// A photo, with or without caption
    Photo,

    /// Anything else (stickers, voice, unknown commands)
    Unsupported,
}

impl Event {
    /// Short label for logs; never includes user text
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Command(Command::Start { .. }) => "command_start",
            Event::Command(Command::Help) => "command_help",
            Event::Menu(_) => "menu",
            Event::UnknownMenu(_) => "unknown_menu",
            Event::Text(_) => "text",
            Event::Photo => "photo",
            Event::Unsupported => "unsupported",
        }
    }
}
