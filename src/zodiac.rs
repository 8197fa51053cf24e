//! Zodiac signs and user input normalization

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZodiacSign {
    Aries,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

impl ZodiacSign {
    pub const ALL: [ZodiacSign; 12] = [
        ZodiacSign::Aries,
        ZodiacSign::Taurus,
        ZodiacSign::Gemini,
        ZodiacSign::Cancer,
        ZodiacSign::Leo,
        ZodiacSign::Virgo,
        ZodiacSign::Libra,
        ZodiacSign::Scorpio,
        ZodiacSign::Sagittarius,
        ZodiacSign::Capricorn,
        ZodiacSign::Aquarius,
        ZodiacSign::Pisces,
    ];

    /// Canonical (capitalized) Russian name
    pub fn name(self) -> &'static str {
        match self {
            ZodiacSign::Aries => "Овен",
            ZodiacSign::Taurus => "Телец",
            ZodiacSign::Gemini => "Близнецы",
            ZodiacSign::Cancer => "Рак",
            ZodiacSign::Leo => "Лев",
            ZodiacSign::Virgo => "Дева",
            ZodiacSign::Libra => "Весы",
            ZodiacSign::Scorpio => "Скорпион",
            ZodiacSign::Sagittarius => "Стрелец",
            ZodiacSign::Capricorn => "Козерог",
            ZodiacSign::Aquarius => "Водолей",
            ZodiacSign::Pisces => "Рыбы",
        }
    }

    /// All sign names joined with ", " in calendar order
    pub fn listing() -> String {
        Self::ALL
            .iter()
            .map(|s| s.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ZodiacSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown zodiac sign: {0:?}")]
pub struct ZodiacParseError(pub String);

impl FromStr for ZodiacSign {
    type Err = ZodiacParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let normalized = capitalize(input.trim());
        Self::ALL
            .into_iter()
            .find(|sign| sign.name() == normalized)
            .ok_or(ZodiacParseError(normalized))
    }
}

/// Upper-case the first character and lower-case the rest
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
