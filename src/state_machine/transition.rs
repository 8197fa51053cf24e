//! Pure state transition function
//!
//! Given the same state and event this always produces the same result.
//! Card draws, dates and completions happen later, when the dispatcher
//! executes the effects.

use super::{ConvState, Divination, Effect, Event};
use crate::menu::{self, MenuCode, Reply};
use crate::prompts::PalmInput;
use crate::state_machine::event::Command;
use crate::zodiac::ZodiacSign;

/// Result of a state transition
#[derive(Debug, PartialEq, Eq)]
pub struct TransitionResult {
    pub new_state: ConvState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConvState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    fn reply(self, reply: Reply) -> Self {
        self.with_effect(Effect::Reply(reply))
    }

    fn divine(self, divination: Divination) -> Self {
        self.with_effect(Effect::Divine(divination))
    }
}

/// Pure transition function. Total: every (state, event) pair has an outcome.
pub fn transition(state: ConvState, event: Event) -> TransitionResult {
    match (state, event) {
        // ============================================================
        // Commands restart the conversation
        // ============================================================
        (_, Event::Command(Command::Start { display_name })) => TransitionResult::new(
            ConvState::Idle,
        )
        .reply(Reply::text(menu::welcome_text(&display_name)).with_keyboard(menu::main_menu())),

        (_, Event::Command(Command::Help)) => TransitionResult::new(ConvState::Idle)
            .reply(Reply::text(menu::HELP_COMMAND_TEXT).with_keyboard(menu::main_menu())),

        // ============================================================
        // Menu taps are accepted from every state; a tap abandons any
        // pending input flow.
        // ============================================================
        (_, Event::Menu(code)) => menu_transition(code),

        (state, Event::UnknownMenu(_)) => TransitionResult::new(state)
            .reply(Reply::text(menu::NEUTRAL_TEXT).with_keyboard(menu::main_menu())),

        // ============================================================
        // Free text while a flow expects it
        // ============================================================
        (ConvState::AwaitingZodiacSign, Event::Text(text)) => match text.parse::<ZodiacSign>() {
            Ok(sign) => {
                TransitionResult::new(ConvState::Idle).divine(Divination::HoroscopeToday(sign))
            }
            Err(_) => reprompt(
                ConvState::AwaitingZodiacSign,
                format!(
                    "Пожалуйста, введите корректный знак зодиака из списка:\n{}",
                    ZodiacSign::listing()
                ),
            ),
        },

        (state, Event::Text(text)) if state.is_awaiting_input() && text.trim().is_empty() => {
            reprompt(state, menu::TEXT_EXPECTED)
        }

        // Birth dates are passed through unvalidated; the model copes with
        // any reasonable format.
        (ConvState::AwaitingBirthdate, Event::Text(text)) => {
            TransitionResult::new(ConvState::Idle).divine(Divination::NatalChart {
                birthdate: text.trim().to_string(),
            })
        }

        (ConvState::AwaitingPalmInput, Event::Text(text)) => TransitionResult::new(
            ConvState::Idle,
        )
        .divine(Divination::Palm(PalmInput::Description(
            text.trim().to_string(),
        ))),

        (ConvState::AwaitingPalmInput, Event::Photo) => {
            TransitionResult::new(ConvState::Idle).divine(Divination::Palm(PalmInput::Photo))
        }

        (ConvState::AwaitingPalmInput, Event::Unsupported) => {
            reprompt(ConvState::AwaitingPalmInput, menu::PALMISTRY_RETRY_TEXT)
        }

        (ConvState::AwaitingQuestion, Event::Text(text)) => {
            TransitionResult::new(ConvState::Idle).divine(Divination::Prediction {
                question: text.trim().to_string(),
            })
        }

        // ============================================================
        // Input nobody asked for
        // ============================================================
        (ConvState::Idle, Event::Text(_) | Event::Photo | Event::Unsupported) => {
            TransitionResult::new(ConvState::Idle)
                .reply(Reply::text(menu::NEUTRAL_TEXT).with_keyboard(menu::main_menu()))
        }

        (
            state @ (ConvState::AwaitingQuestion
            | ConvState::AwaitingZodiacSign
            | ConvState::AwaitingBirthdate),
            Event::Photo | Event::Unsupported,
        ) => reprompt(state, menu::TEXT_EXPECTED),
    }
}

fn menu_transition(code: MenuCode) -> TransitionResult {
    match code {
        MenuCode::BackMain => TransitionResult::new(ConvState::Idle)
            .reply(Reply::text(menu::MAIN_MENU_TEXT).with_keyboard(menu::main_menu())),

        // Submenus
        MenuCode::Tarot => TransitionResult::new(ConvState::Idle)
            .reply(Reply::text(menu::TAROT_MENU_TEXT).with_keyboard(menu::tarot_menu())),
        MenuCode::Astrology => TransitionResult::new(ConvState::Idle)
            .reply(Reply::text(menu::ASTROLOGY_MENU_TEXT).with_keyboard(menu::astrology_menu())),
        MenuCode::Help => TransitionResult::new(ConvState::Idle)
            .reply(Reply::text(menu::HELP_TEXT).with_keyboard(menu::back_only())),

        // Flows that need input first
        MenuCode::Palmistry => await_input(ConvState::AwaitingPalmInput, menu::PALMISTRY_PROMPT_TEXT),
        MenuCode::Prediction => {
            await_input(ConvState::AwaitingQuestion, menu::PREDICTION_PROMPT_TEXT)
        }
        MenuCode::HoroscopeToday => {
            await_input(ConvState::AwaitingZodiacSign, menu::ZODIAC_PROMPT_TEXT)
        }
        MenuCode::NatalChart => await_input(ConvState::AwaitingBirthdate, menu::BIRTHDATE_PROMPT_TEXT),

        // Immediate readings
        MenuCode::TarotDay => TransitionResult::new(ConvState::Idle).divine(Divination::TarotDay),
        MenuCode::TarotThree => {
            TransitionResult::new(ConvState::Idle).divine(Divination::TarotThree)
        }
        MenuCode::TarotLove => TransitionResult::new(ConvState::Idle).divine(Divination::TarotLove),
        MenuCode::TarotYesNo => {
            TransitionResult::new(ConvState::Idle).divine(Divination::TarotYesNo)
        }
        MenuCode::HoroscopeWeek => {
            TransitionResult::new(ConvState::Idle).divine(Divination::HoroscopeWeek)
        }
    }
}

fn await_input(state: ConvState, prompt: &'static str) -> TransitionResult {
    reprompt(state, prompt)
}

/// Stay in an input flow; the back button keeps it cancellable
fn reprompt(state: ConvState, text: impl Into<String>) -> TransitionResult {
    TransitionResult::new(state).reply(Reply::text(text).with_keyboard(menu::back_only()))
}
