//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::*;
use crate::menu::MenuCode;
use crate::zodiac::ZodiacSign;
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_state() -> impl Strategy<Value = ConvState> {
    prop::sample::select(ConvState::ALL.to_vec())
}

fn arb_menu_code() -> impl Strategy<Value = MenuCode> {
    prop::sample::select(MenuCode::ALL.to_vec())
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        "[a-zA-Zа-яА-Я ]{0,30}".prop_map(|display_name| Event::Command(Command::Start {
            display_name
        })),
        Just(Event::Command(Command::Help)),
        arb_menu_code().prop_map(Event::Menu),
        "[a-z_]{1,20}".prop_map(Event::UnknownMenu),
        "\\PC{0,60}".prop_map(Event::Text),
        Just(Event::Photo),
        Just(Event::Unsupported),
    ]
}

/// Text that cannot normalize to any sign name
fn arb_non_sign_text() -> impl Strategy<Value = String> {
    "\\PC{0,30}".prop_filter("must not be a sign", |s| s.parse::<ZodiacSign>().is_err())
}

fn divinations(result: &TransitionResult) -> usize {
    result
        .effects
        .iter()
        .filter(|e| matches!(e, Effect::Divine(_)))
        .count()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Every transition yields at least one effect, so the user always hears back
    #[test]
    fn prop_every_event_is_answered(state in arb_state(), event in arb_event()) {
        let result = transition(state, event);
        prop_assert!(!result.effects.is_empty());
    }

    /// A reading always ends the flow
    #[test]
    fn prop_readings_return_to_idle(state in arb_state(), event in arb_event()) {
        let result = transition(state, event);
        prop_assert!(divinations(&result) <= 1);
        if divinations(&result) == 1 {
            prop_assert_eq!(result.new_state, ConvState::Idle);
        }
    }

    #[test]
    fn prop_back_main_always_goes_idle(state in arb_state()) {
        let result = transition(state, Event::Menu(MenuCode::BackMain));
        prop_assert_eq!(result.new_state, ConvState::Idle);
        prop_assert_eq!(divinations(&result), 0);
    }

    #[test]
    fn prop_invalid_zodiac_stays_put(text in arb_non_sign_text()) {
        let result = transition(ConvState::AwaitingZodiacSign, Event::Text(text));
        prop_assert_eq!(result.new_state, ConvState::AwaitingZodiacSign);
        prop_assert_eq!(divinations(&result), 0);
    }

    #[test]
    fn prop_any_sign_spelling_is_accepted(index in 0usize..12, upper in any::<bool>()) {
        let sign = ZodiacSign::ALL[index];
        let text = if upper { sign.name().to_uppercase() } else { sign.name().to_lowercase() };
        let result = transition(ConvState::AwaitingZodiacSign, Event::Text(format!("  {text} ")));
        prop_assert_eq!(result.new_state, ConvState::Idle);
        prop_assert_eq!(result.effects, vec![Effect::Divine(Divination::HoroscopeToday(sign))]);
    }

    /// Idle never moves on free input alone
    #[test]
    fn prop_idle_ignores_unprompted_input(text in "\\PC{0,60}") {
        for event in [Event::Text(text.clone()), Event::Photo, Event::Unsupported] {
            let result = transition(ConvState::Idle, event);
            prop_assert_eq!(result.new_state, ConvState::Idle);
            prop_assert_eq!(divinations(&result), 0);
        }
    }

    #[test]
    fn prop_transition_is_deterministic(state in arb_state(), event in arb_event()) {
        prop_assert_eq!(transition(state, event.clone()), transition(state, event));
    }
}
