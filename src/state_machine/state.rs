//! Conversation state types

/// Conversation state
///
/// One per conversation. Only the awaiting states expect free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConvState {
    /// Menu navigation, no pending input
    #[default]
    Idle,

    /// Waiting for a question to answer with a prediction
    AwaitingQuestion,

    /// Waiting for a zodiac sign for today's horoscope
    AwaitingZodiacSign,

    /// Waiting for a birth date for the natal chart
    AwaitingBirthdate,

    /// Waiting for a palm photo or a description of the lines
    AwaitingPalmInput,
}

impl ConvState {
    #[cfg(test)]
    pub const ALL: [ConvState; 5] = [
        ConvState::Idle,
        ConvState::AwaitingQuestion,
        ConvState::AwaitingZodiacSign,
        ConvState::AwaitingBirthdate,
        ConvState::AwaitingPalmInput,
    ];

    /// Check if a flow is waiting for user input
    pub fn is_awaiting_input(self) -> bool {
        !matches!(self, ConvState::Idle)
    }

    /// Stable name for logs
    pub fn name(self) -> &'static str {
        match self {
            ConvState::Idle => "idle",
            ConvState::AwaitingQuestion => "awaiting_question",
            ConvState::AwaitingZodiacSign => "awaiting_zodiac_sign",
            ConvState::AwaitingBirthdate => "awaiting_birthdate",
            ConvState::AwaitingPalmInput => "awaiting_palm_input",
        }
    }
}
