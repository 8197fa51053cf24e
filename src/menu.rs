//! Menu codes, keyboards, and the reply model shared with the transport

use crate::state_machine::{transition, ConvState, Effect, Event};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Button codes carried in callback data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuCode {
    Tarot,
    TarotDay,
    TarotThree,
    TarotLove,
    TarotYesNo,
    Palmistry,
    Astrology,
    HoroscopeToday,
    HoroscopeWeek,
    NatalChart,
    Prediction,
    Help,
    BackMain,
}

/// Which kind of handler a menu code is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    /// Shows another menu; no input expected
    Submenu,
    /// Asks the user for free-form input
    AwaitInput,
    /// Produces a reading immediately
    Reading,
    /// Returns to the main menu and cancels any pending flow
    Home,
}

impl MenuCode {
    pub const ALL: [MenuCode; 13] = [
        MenuCode::Tarot,
        MenuCode::TarotDay,
        MenuCode::TarotThree,
        MenuCode::TarotLove,
        MenuCode::TarotYesNo,
        MenuCode::Palmistry,
        MenuCode::Astrology,
        MenuCode::HoroscopeToday,
        MenuCode::HoroscopeWeek,
        MenuCode::NatalChart,
        MenuCode::Prediction,
        MenuCode::Help,
        MenuCode::BackMain,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MenuCode::Tarot => "tarot",
            MenuCode::TarotDay => "tarot_day",
            MenuCode::TarotThree => "tarot_three",
            MenuCode::TarotLove => "tarot_love",
            MenuCode::TarotYesNo => "tarot_yesno",
            MenuCode::Palmistry => "palmistry",
            MenuCode::Astrology => "astrology",
            MenuCode::HoroscopeToday => "horoscope_today",
            MenuCode::HoroscopeWeek => "horoscope_week",
            MenuCode::NatalChart => "natal_chart",
            MenuCode::Prediction => "prediction",
            MenuCode::Help => "help",
            MenuCode::BackMain => "back_main",
        }
    }

    pub fn action(self) -> MenuAction {
        match self {
            MenuCode::Tarot | MenuCode::Astrology | MenuCode::Help => MenuAction::Submenu,
            MenuCode::Palmistry
            | MenuCode::HoroscopeToday
            | MenuCode::NatalChart
            | MenuCode::Prediction => MenuAction::AwaitInput,
            MenuCode::TarotDay
            | MenuCode::TarotThree
            | MenuCode::TarotLove
            | MenuCode::TarotYesNo
            | MenuCode::HoroscopeWeek => MenuAction::Reading,
            MenuCode::BackMain => MenuAction::Home,
        }
    }
}

impl fmt::Display for MenuCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown menu code: {0:?}")]
pub struct UnknownMenuCode(pub String);

impl FromStr for MenuCode {
    type Err = UnknownMenuCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| UnknownMenuCode(s.to_string()))
    }
}

// ============================================================================
// Reply model
// ============================================================================

/// How the transport should interpret emphasis markers in the text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextFormat {
    #[default]
    Plain,
    /// `*bold*` and `_italic_` spans
    Markdown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: &'static str,
    pub code: MenuCode,
}

impl Button {
    pub const fn new(label: &'static str, code: MenuCode) -> Self {
        Self { label, code }
    }
}

/// Ordered rows of inline buttons
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    /// One button per row
    fn column(buttons: impl IntoIterator<Item = Button>) -> Self {
        Self {
            rows: buttons.into_iter().map(|b| vec![b]).collect(),
        }
    }

    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }
}

/// A message the bot sends back to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<Keyboard>,
    pub format: TextFormat,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
            format: TextFormat::Plain,
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }

    pub fn markdown(mut self) -> Self {
        self.format = TextFormat::Markdown;
        self
    }
}

// ============================================================================
// Fixed texts
// ============================================================================

pub const MAIN_MENU_TEXT: &str = "🔮 Главное меню. Выбери интересующую тебя область:";
pub const TAROT_MENU_TEXT: &str = "🃏 Выбери расклад Таро:";
pub const ASTROLOGY_MENU_TEXT: &str = "⭐ Выбери тип астрологического прогноза:";
pub const NEUTRAL_TEXT: &str = "🔮 Выбери, что тебя интересует, в меню ниже:";
pub const BUSY_TEXT: &str = "⏳ Подожди немного, я ещё отвечаю на предыдущий запрос...";

pub const HELP_TEXT: &str = "ℹ️ Помощь\n\n\
Команды бота:\n\
/start - Главное меню\n\
/help - Эта справка\n\n\
Возможности:\n\
• Таро - различные расклады карт\n\
• Хиромантия - анализ линий на ладони\n\
• Астрология - гороскопы и натальные карты\n\
• Предсказания - ответы на твои вопросы\n\n\
Все предсказания генерируются с помощью AI.";

pub const HELP_COMMAND_TEXT: &str = "ℹ️ Помощь\n\n\
Команды бота:\n\
/start - Главное меню\n\
/help - Эта справка\n\n\
Используй меню для навигации по функциям бота.";

pub const PALMISTRY_PROMPT_TEXT: &str = "✋ Хиромантия\n\n\
Отправь мне фото своей ладони (желательно правой руки) с хорошим освещением. \
Или опиши основные линии:\n\n\
• Линия жизни (дуга от большого пальца)\n\
• Линия сердца (горизонтальная линия вверху)\n\
• Линия ума (горизонтальная линия в центре)\n\
• Линия судьбы (вертикальная линия)\n\n\
Какие из них длинные, короткие, прерывистые?";

pub const PALMISTRY_RETRY_TEXT: &str =
    "Пожалуйста, отправьте фото ладони или опишите основные линии текстом.";

pub const PREDICTION_PROMPT_TEXT: &str = "🎱 Задай мне свой вопрос, и я загляну в будущее...\n\n\
Напиши свой вопрос одним сообщением.";

pub const ZODIAC_PROMPT_TEXT: &str = "⭐ Введите ваш знак зодиака:";

pub const BIRTHDATE_PROMPT_TEXT: &str =
    "🌟 Для натальной карты введите дату рождения в формате ДД.ММ.ГГГГ\nНапример: 15.03.1990";

pub const TEXT_EXPECTED: &str = "Пожалуйста, ответь текстовым сообщением.";

pub fn welcome_text(display_name: &str) -> String {
    format!(
        "🔮 Приветствую тебя, {display_name}!\n\n\
         Я - Мистический помощник, твой проводник в мир эзотерики и предсказаний.\n\n\
         Я могу:\n\
         🃏 Погадать на картах Таро\n\
         ✋ Прочитать линии на твоей ладони\n\
         ⭐ Составить астрологический прогноз\n\
         🎱 Предсказать будущее\n\n\
         Выбери, что тебя интересует:"
    )
}

// ============================================================================
// Keyboards
// ============================================================================

const BACK: Button = Button::new("⬅️ Назад", MenuCode::BackMain);
const HOME: Button = Button::new("⬅️ Главное меню", MenuCode::BackMain);

pub fn main_menu() -> Keyboard {
    Keyboard::column([
        Button::new("🔮 Таро", MenuCode::Tarot),
        Button::new("✋ Хиромантия", MenuCode::Palmistry),
        Button::new("⭐ Астрология", MenuCode::Astrology),
        Button::new("🎱 Предсказание", MenuCode::Prediction),
        Button::new("ℹ️ Помощь", MenuCode::Help),
    ])
}

pub fn tarot_menu() -> Keyboard {
    Keyboard::column([
        Button::new("Карта дня", MenuCode::TarotDay),
        Button::new("Три карты (прошлое-настоящее-будущее)", MenuCode::TarotThree),
        Button::new("Расклад на любовь", MenuCode::TarotLove),
        Button::new("Ответ Да/Нет", MenuCode::TarotYesNo),
        BACK,
    ])
}

pub fn astrology_menu() -> Keyboard {
    Keyboard::column([
        Button::new("Гороскоп на сегодня", MenuCode::HoroscopeToday),
        Button::new("Гороскоп на неделю", MenuCode::HoroscopeWeek),
        Button::new("Натальная карта", MenuCode::NatalChart),
        BACK,
    ])
}

/// A lone back button, shown under help and while waiting for input
pub fn back_only() -> Keyboard {
    Keyboard::column([BACK])
}

/// Shown under a tarot spread
pub fn after_tarot(more_label: &'static str) -> Keyboard {
    Keyboard::column([Button::new(more_label, MenuCode::Tarot), HOME])
}

/// Shown under the weekly horoscope
pub fn after_astrology() -> Keyboard {
    Keyboard::column([
        Button::new("⬅️ Назад", MenuCode::Astrology),
        Button::new("🏠 Главное меню", MenuCode::BackMain),
    ])
}

#[derive(Debug, Error)]
pub enum MenuError {
    #[error("button {label:?} uses code {code:?} which does not round-trip")]
    Unroutable { label: &'static str, code: MenuCode },
    #[error("menu code {0} is not reachable from any keyboard")]
    Unreachable(MenuCode),
    #[error("menu code {0} does not behave as its action declares")]
    ActionMismatch(MenuCode),
}

/// Check at startup that every button routes to a handler and every code
/// is offered by some keyboard.
pub fn validate_menus() -> Result<(), MenuError> {
    let keyboards = [
        main_menu(),
        tarot_menu(),
        astrology_menu(),
        back_only(),
        after_tarot("🔮 Ещё расклад"),
        after_astrology(),
    ];

    let mut offered = Vec::new();
    for button in keyboards.iter().flat_map(Keyboard::buttons) {
        if button.code.as_str().parse::<MenuCode>().ok() != Some(button.code) {
            return Err(MenuError::Unroutable {
                label: button.label,
                code: button.code,
            });
        }
        offered.push(button.code);
    }

    for code in MenuCode::ALL {
        if !offered.contains(&code) {
            return Err(MenuError::Unreachable(code));
        }
        if !action_matches(code) {
            return Err(MenuError::ActionMismatch(code));
        }
    }
    Ok(())
}

/// Tap the code from `Idle` and compare the outcome with its declared action
fn action_matches(code: MenuCode) -> bool {
    let result = transition(ConvState::Idle, Event::Menu(code));
    match code.action() {
        MenuAction::Reading => matches!(result.effects.as_slice(), [Effect::Divine(_)]),
        MenuAction::AwaitInput => result.new_state.is_awaiting_input(),
        MenuAction::Submenu | MenuAction::Home => {
            result.new_state == ConvState::Idle
                && matches!(
                    result.effects.as_slice(),
                    [Effect::Reply(Reply { keyboard: Some(_), .. })]
                )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for code in MenuCode::ALL {
            assert_eq!(code.as_str().parse::<MenuCode>(), Ok(code));
        }
        assert_eq!(
            "tarot_celtic".parse::<MenuCode>(),
            Err(UnknownMenuCode("tarot_celtic".to_string()))
        );
    }

    #[test]
    fn test_menus_validate() {
        validate_menus().unwrap();
    }

    #[test]
    fn test_main_menu_layout() {
        let codes: Vec<_> = main_menu().buttons().map(|b| b.code).collect();
        assert_eq!(
            codes,
            vec![
                MenuCode::Tarot,
                MenuCode::Palmistry,
                MenuCode::Astrology,
                MenuCode::Prediction,
                MenuCode::Help,
            ]
        );
        assert!(main_menu().rows.iter().all(|row| row.len() == 1));
    }

    #[test]
    fn test_submenus_end_with_back() {
        for keyboard in [tarot_menu(), astrology_menu()] {
            let last = keyboard.buttons().last().unwrap();
            assert_eq!(last.code, MenuCode::BackMain);
        }
    }

    #[test]
    fn test_welcome_uses_display_name() {
        let text = welcome_text("Анна");
        assert!(text.starts_with("🔮 Приветствую тебя, Анна!"));
    }
}
