//! Persona prompts for every reading the bot offers
//!
//! Pure and deterministic: the same `Reading` always yields the same
//! `PromptSpec`. Dates and cards are supplied by the caller.

use crate::deck::Card;
use crate::zodiac::ZodiacSign;
use chrono::NaiveDate;

/// Appended to tarot personas; the model tends to drift without it
const LITERATE_RUSSIAN: &str = "ВАЖНО: Отвечай ТОЛЬКО на русском языке с АБСОЛЮТНО ГРАМОТНОЙ \
орфографией и пунктуацией. Проверяй каждое слово на правильность написания. \
Используй литературный русский язык.";

const RUSSIAN_ANSWER: &str = "Ответ на русском языке.";

const TAROT_DAY_PERSONA: &str = "Ты опытный таролог с глубокими знаниями карт Таро. \
Дай подробное толкование карты дня. Объясни, что эта карта означает для человека \
на сегодняшний день. Пиши мистически и загадочно, но содержательно.";

const TAROT_THREE_PERSONA: &str = "Ты опытный таролог. Сделай расклад на три карты: \
прошлое, настоящее и будущее. Дай глубокое толкование каждой карты и общую картину. \
Пиши мистически, но содержательно.";

const TAROT_LOVE_PERSONA: &str = "Ты опытный таролог, специализирующийся на любовных \
раскладах. Сделай расклад на любовь из трех карт: 1) Ты, 2) Партнер, 3) Отношения. \
Дай глубокое толкование. Пиши романтично и мистически.";

const TAROT_YES_NO_PERSONA: &str = "Ты таролог. Дай ответ Да или Нет на основе выпавшей \
карты. Объясни почему карта говорит именно так. Будь загадочным.";

const HOROSCOPE_TODAY_PERSONA: &str = "Ты профессиональный астролог. Составь подробный \
гороскоп на сегодня для указанного знака зодиака. Пиши загадочно и мистически.";

const HOROSCOPE_WEEK_PERSONA: &str = "Ты профессиональный астролог. Составь краткий общий \
гороскоп на неделю. Упомяни ключевые астрологические события недели. \
Пиши загадочно и мистически.";

const NATAL_CHART_PERSONA: &str = "Ты опытный астролог. Составь краткую натальную карту \
для человека, родившегося в указанную дату. Опиши основные черты характера, \
предназначение, сильные стороны. Пиши мистически и вдохновляюще.";

const PALM_PERSONA: &str = "Ты опытный хиромант с глубокими знаниями чтения по руке. \
Проанализируй описание ладони или скажи что видишь фото и дай подробное толкование. \
Опиши что означают линии жизни, сердца, ума, судьбы для этого человека. \
Расскажи о характере человека, его судьбе и будущем. Пиши загадочно и мистически.";

const PREDICTION_PERSONA: &str = "Ты мистический предсказатель и ясновидящий. \
Дай загадочное и глубокое предсказание на вопрос пользователя. \
Будь мистичным, используй образы и метафоры.";

const PALM_PHOTO_REQUEST: &str = "Пользователь прислал фото своей ладони. \
Дай подробное хиромантическое толкование, основываясь на общих принципах хиромантии. \
Опиши значение основных линий и что они говорят о характере и судьбе человека.";

/// A (system, user) prompt pair for one completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSpec {
    pub system: String,
    pub user: String,
}

/// What the user sent for a palm reading
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PalmInput {
    Description(String),
    Photo,
}

/// A fully specified reading, ready to be turned into a prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reading {
    TarotDay {
        card: Card,
    },
    TarotThree {
        past: Card,
        present: Card,
        future: Card,
    },
    TarotLove {
        you: Card,
        partner: Card,
        relationship: Card,
    },
    TarotYesNo {
        card: Card,
    },
    HoroscopeToday {
        sign: ZodiacSign,
        date: NaiveDate,
    },
    HoroscopeWeek {
        date: NaiveDate,
    },
    NatalChart {
        birthdate: String,
    },
    Palm(PalmInput),
    Prediction {
        question: String,
    },
}

impl Reading {
    pub fn prompt(&self) -> PromptSpec {
        match self {
            Reading::TarotDay { card } => PromptSpec {
                system: tarot_persona(TAROT_DAY_PERSONA),
                user: format!("Выпала карта: {card}. Дай толкование этой карты как карты дня."),
            },
            Reading::TarotThree {
                past,
                present,
                future,
            } => PromptSpec {
                system: tarot_persona(TAROT_THREE_PERSONA),
                user: format!(
                    "Выпали карты:\nПрошлое: {past}\nНастоящее: {present}\nБудущее: {future}\n\n\
                     Дай подробное толкование этого расклада."
                ),
            },
            Reading::TarotLove {
                you,
                partner,
                relationship,
            } => PromptSpec {
                system: tarot_persona(TAROT_LOVE_PERSONA),
                user: format!(
                    "Любовный расклад:\nТы: {you}\nПартнер: {partner}\nОтношения: {relationship}\n\n\
                     Дай подробное толкование."
                ),
            },
            Reading::TarotYesNo { card } => PromptSpec {
                system: tarot_persona(TAROT_YES_NO_PERSONA),
                user: format!("Выпала карта: {card}. Это Да или Нет? Объясни."),
            },
            Reading::HoroscopeToday { sign, date } => PromptSpec {
                system: persona(HOROSCOPE_TODAY_PERSONA),
                user: format!(
                    "Составь гороскоп на сегодня для знака {sign}. Сегодня {}",
                    format_date(*date)
                ),
            },
            Reading::HoroscopeWeek { date } => PromptSpec {
                system: persona(HOROSCOPE_WEEK_PERSONA),
                user: format!(
                    "Составь общий гороскоп на неделю. Сегодня {}",
                    format_date(*date)
                ),
            },
            Reading::NatalChart { birthdate } => PromptSpec {
                system: persona(NATAL_CHART_PERSONA),
                user: format!("Составь натальную карту для человека, родившегося {birthdate}"),
            },
            Reading::Palm(PalmInput::Description(description)) => PromptSpec {
                system: persona(PALM_PERSONA),
                user: format!(
                    "Пользователь описал свою ладонь: {description}\n\n\
                     Дай хиромантическое толкование на основе этого описания."
                ),
            },
            Reading::Palm(PalmInput::Photo) => PromptSpec {
                system: persona(PALM_PERSONA),
                user: PALM_PHOTO_REQUEST.to_string(),
            },
            Reading::Prediction { question } => PromptSpec {
                system: persona(PREDICTION_PERSONA),
                user: format!("Вопрос: {question}\n\nДай предсказание."),
            },
        }
    }
}

/// Date format used in prompts and replies (`ДД.ММ.ГГГГ`)
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

fn tarot_persona(base: &str) -> String {
    format!("{base} {LITERATE_RUSSIAN}")
}

fn persona(base: &str) -> String {
    format!("{base} {RUSSIAN_ANSWER}")
}
