//! Tarot deck and card drawing
//!
//! The only source of randomness in the bot. The RNG is injectable so that
//! tests can reproduce a draw from a seed.

use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// The 22 major arcana, in traditional order
pub const MAJOR_ARCANA: [&str; 22] = [
    "Шут",
    "Маг",
    "Верховная Жрица",
    "Императрица",
    "Император",
    "Иерофант",
    "Влюблённые",
    "Колесница",
    "Сила",
    "Отшельник",
    "Колесо Фортуны",
    "Справедливость",
    "Повешенный",
    "Смерть",
    "Умеренность",
    "Дьявол",
    "Башня",
    "Звезда",
    "Луна",
    "Солнце",
    "Суд",
    "Мир",
];

/// A card drawn from the deck
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Card(&'static str);

impl Card {
    pub fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeckError {
    #[error("cannot draw {requested} cards from a deck of {available}")]
    NotEnoughCards { requested: usize, available: usize },
}

/// Source of card draws
pub trait DeckProvider: Send + Sync {
    /// Draw `n` distinct cards. The order of the result is the draw order.
    fn draw(&self, n: usize) -> Result<Vec<Card>, DeckError>;
}

/// Uniform draws without replacement over [`MAJOR_ARCANA`]
pub struct RandomDeck {
    rng: Mutex<StdRng>,
}

impl RandomDeck {
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl DeckProvider for RandomDeck {
    fn draw(&self, n: usize) -> Result<Vec<Card>, DeckError> {
        let available = MAJOR_ARCANA.len();
        if n > available {
            return Err(DeckError::NotEnoughCards {
                requested: n,
                available,
            });
        }

        // A panic while holding the lock cannot leave the RNG in a bad state
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(index::sample(&mut *rng, available, n)
            .into_iter()
            .map(|i| Card(MAJOR_ARCANA[i]))
            .collect())
    }
}
