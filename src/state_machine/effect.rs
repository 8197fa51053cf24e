//! Effects produced by state transitions

use crate::menu::Reply;
use crate::prompts::PalmInput;
use crate::zodiac::ZodiacSign;

/// A reading requested by the user, before cards are drawn and the date is
/// fixed. Resolving it into a [`crate::prompts::Reading`] is the
/// dispatcher's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Divination {
    TarotDay,
    TarotThree,
    TarotLove,
    TarotYesNo,
    HoroscopeToday(ZodiacSign),
    HoroscopeWeek,
    NatalChart { birthdate: String },
    Palm(PalmInput),
    Prediction { question: String },
}

impl Divination {
    /// Number of cards the spread needs
    pub fn cards_needed(&self) -> usize {
        match self {
            Divination::TarotDay | Divination::TarotYesNo => 1,
            Divination::TarotThree | Divination::TarotLove => 3,
            _ => 0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Divination::TarotDay => "tarot_day",
            Divination::TarotThree => "tarot_three",
            Divination::TarotLove => "tarot_love",
            Divination::TarotYesNo => "tarot_yesno",
            Divination::HoroscopeToday(_) => "horoscope_today",
            Divination::HoroscopeWeek => "horoscope_week",
            Divination::NatalChart { .. } => "natal_chart",
            Divination::Palm(_) => "palm_reading",
            Divination::Prediction { .. } => "prediction",
        }
    }
}

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send a fixed reply
    Reply(Reply),

    /// Produce a reading with the completion client
    Divine(Divination),
}
