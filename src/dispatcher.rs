//! Menu/state dispatcher
//!
//! Runs the pure transition for an event, then executes its effects: fixed
//! replies pass straight through, readings draw cards, build a prompt, call
//! the completion client and format the result.

use crate::deck::{Card, DeckError, DeckProvider};
use crate::llm::{CompletionClient, FALLBACK_MESSAGE};
use crate::menu::{self, Reply};
use crate::prompts::Reading;
use crate::state_machine::{transition, ConvState, Divination, Effect, Event};
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Source of "today" for horoscopes
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local wall-clock date
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// New state plus everything to send back, in order
#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub new_state: ConvState,
    pub replies: Vec<Reply>,
}

pub struct Dispatcher {
    deck: Arc<dyn DeckProvider>,
    completion: Arc<CompletionClient>,
    clock: Arc<dyn Clock>,
}

impl Dispatcher {
    pub fn new(
        deck: Arc<dyn DeckProvider>,
        completion: Arc<CompletionClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            deck,
            completion,
            clock,
        }
    }

    /// Handle one event and collect all replies.
    ///
    /// Same as [`Self::handle_streaming`] with the replies gathered up
    /// afterwards; the runtime drains them live instead.
    #[cfg(test)]
    pub async fn handle(&self, state: ConvState, event: Event) -> Outcome {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let new_state = self.handle_streaming(state, event, tx).await;

        let mut replies = Vec::new();
        while let Ok(reply) = rx.try_recv() {
            replies.push(reply);
        }
        Outcome { new_state, replies }
    }

    /// Handle one event, pushing each reply as soon as it is ready.
    ///
    /// Progress notices go out before the completion call, so a transport
    /// draining `replies` concurrently can show them while the user waits.
    pub async fn handle_streaming(
        &self,
        state: ConvState,
        event: Event,
        replies: mpsc::UnboundedSender<Reply>,
    ) -> ConvState {
        let event_kind = event.kind();
        let result = transition(state, event);

        tracing::debug!(
            from = state.name(),
            to = result.new_state.name(),
            event = event_kind,
            effects = result.effects.len(),
            "Transition"
        );

        for effect in result.effects {
            let reply = match effect {
                Effect::Reply(reply) => reply,
                Effect::Divine(divination) => {
                    // A closed receiver means nobody is listening; the reading
                    // is still produced so the flow completes.
                    let _ = replies.send(progress_reply(&divination));
                    self.divine(divination).await
                }
            };
            let _ = replies.send(reply);
        }

        result.new_state
    }

    async fn divine(&self, divination: Divination) -> Reply {
        let name = divination.name();
        let reading = match self.resolve(divination) {
            Ok(reading) => reading,
            Err(e) => {
                tracing::error!(reading = name, error = %e, "Failed to draw cards");
                return Reply::text(FALLBACK_MESSAGE).with_keyboard(menu::main_menu());
            }
        };

        let prompt = reading.prompt();
        let text = self.completion.generate(&prompt.system, &prompt.user).await;
        tracing::info!(reading = name, chars = text.chars().count(), "Reading delivered");
        format_reading(&reading, &text)
    }

    /// Fix the random and time-dependent parts of a reading
    fn resolve(&self, divination: Divination) -> Result<Reading, DeckError> {
        let cards = self.deck.draw(divination.cards_needed())?;
        let reading = match divination {
            Divination::TarotDay => Reading::TarotDay {
                card: card_at(&cards, 0)?,
            },
            Divination::TarotYesNo => Reading::TarotYesNo {
                card: card_at(&cards, 0)?,
            },
            Divination::TarotThree => Reading::TarotThree {
                past: card_at(&cards, 0)?,
                present: card_at(&cards, 1)?,
                future: card_at(&cards, 2)?,
            },
            Divination::TarotLove => Reading::TarotLove {
                you: card_at(&cards, 0)?,
                partner: card_at(&cards, 1)?,
                relationship: card_at(&cards, 2)?,
            },
            Divination::HoroscopeToday(sign) => Reading::HoroscopeToday {
                sign,
                date: self.clock.today(),
            },
            Divination::HoroscopeWeek => Reading::HoroscopeWeek {
                date: self.clock.today(),
            },
            Divination::NatalChart { birthdate } => Reading::NatalChart { birthdate },
            Divination::Palm(input) => Reading::Palm(input),
            Divination::Prediction { question } => Reading::Prediction { question },
        };
        Ok(reading)
    }
}

/// A provider that returns fewer cards than asked is treated as an overdraw
fn card_at(cards: &[Card], index: usize) -> Result<Card, DeckError> {
    cards.get(index).copied().ok_or(DeckError::NotEnoughCards {
        requested: index + 1,
        available: cards.len(),
    })
}

fn progress_reply(divination: &Divination) -> Reply {
    let text = match divination {
        Divination::TarotDay => "🔮 Вытягиваю карту дня...".to_string(),
        Divination::TarotThree => "🔮 Делаю расклад на три карты...".to_string(),
        Divination::TarotLove => "💕 Делаю расклад на любовь...".to_string(),
        Divination::TarotYesNo => "🎱 Спрашиваю карты...".to_string(),
        Divination::HoroscopeToday(sign) => format!("⭐ Составляю гороскоп для {sign}..."),
        Divination::HoroscopeWeek => "⭐ Составляю недельный гороскоп...".to_string(),
        Divination::NatalChart { .. } => "🌟 Составляю натальную карту...".to_string(),
        Divination::Palm(_) => "✋ Изучаю линии на твоей ладони...".to_string(),
        Divination::Prediction { .. } => "🔮 Заглядываю в будущее...".to_string(),
    };
    Reply::text(text)
}

fn format_reading(reading: &Reading, text: &str) -> Reply {
    match reading {
        Reading::TarotDay { card } => Reply::text(format!("🃏 Карта дня: *{card}*\n\n{text}"))
            .markdown()
            .with_keyboard(menu::after_tarot("🔮 Ещё расклад")),
        Reading::TarotThree {
            past,
            present,
            future,
        } => Reply::text(format!(
            "🃏 Расклад «Прошлое-Настоящее-Будущее»\n\n\
             📜 Прошлое: *{past}*\n\
             ⏳ Настоящее: *{present}*\n\
             🔮 Будущее: *{future}*\n\n\
             {text}"
        ))
        .markdown()
        .with_keyboard(menu::after_tarot("🔮 Ещё расклад")),
        Reading::TarotLove {
            you,
            partner,
            relationship,
        } => Reply::text(format!(
            "💕 Любовный расклад\n\n\
             👤 Ты: *{you}*\n\
             💑 Партнер: *{partner}*\n\
             ❤️ Отношения: *{relationship}*\n\n\
             {text}"
        ))
        .markdown()
        .with_keyboard(menu::after_tarot("🔮 Ещё расклад")),
        Reading::TarotYesNo { card } => Reply::text(format!("🎱 Карта: *{card}*\n\n{text}"))
            .markdown()
            .with_keyboard(menu::after_tarot("🔮 Ещё вопрос")),
        Reading::HoroscopeToday { sign, .. } => {
            Reply::text(format!("⭐ Гороскоп для {sign}\n\n{text}"))
                .with_keyboard(menu::main_menu())
        }
        Reading::HoroscopeWeek { .. } => Reply::text(format!("⭐ Гороскоп на неделю\n\n{text}"))
            .with_keyboard(menu::after_astrology()),
        Reading::NatalChart { birthdate } => Reply::text(format!(
            "🌟 Натальная карта\nДата рождения: {birthdate}\n\n{text}"
        ))
        .with_keyboard(menu::main_menu()),
        Reading::Palm(_) => Reply::text(format!("✋ Чтение по ладони\n\n{text}"))
            .with_keyboard(menu::main_menu()),
        Reading::Prediction { question } => Reply::text(format!(
            "🔮 Предсказание\n\nТвой вопрос: _{question}_\n\n{text}"
        ))
        .markdown()
        .with_keyboard(menu::main_menu()),
    }
}
