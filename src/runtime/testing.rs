//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::traits::{Origin, ReplySink, ReplyTarget};
use super::{InboundEvent, InMemoryStateStore, RuntimeManager};
use crate::deck::RandomDeck;
use crate::dispatcher::{Clock, Dispatcher};
use crate::llm::{CompletionClient, LlmError, LlmRequest, LlmResponse, LlmService};
use crate::menu::Reply;
use crate::state_machine::Event;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};

// ============================================================================
// Mock LLM Service
// ============================================================================

/// Mock LLM service that returns queued responses
pub struct MockLlmService {
    responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    model_id: String,
    /// Record of all requests made
    pub requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlmService {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            model_id: model_id.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful response
    pub fn queue_response(&self, response: LlmResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_response(&self) -> Result<LlmResponse, LlmError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }
}

#[async_trait]
impl LlmService for MockLlmService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.next_response()
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// ============================================================================
// Delayed Mock LLM Service (for concurrency testing)
// ============================================================================

/// Mock LLM service whose requests hang until the test releases them
pub struct DelayedMockLlmService {
    inner: MockLlmService,
    gate: Semaphore,
    /// Notified when a request starts (for test synchronization)
    pub request_started: Arc<Notify>,
}

impl DelayedMockLlmService {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            inner: MockLlmService::new(model_id),
            gate: Semaphore::new(0),
            request_started: Arc::new(Notify::new()),
        }
    }

    pub fn queue_response(&self, response: LlmResponse) {
        self.inner.queue_response(response);
    }

    /// Let `n` pending or future requests complete
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.inner.recorded_requests()
    }
}

#[async_trait]
impl LlmService for DelayedMockLlmService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.inner.requests.lock().unwrap().push(request.clone());
        self.request_started.notify_one();
        self.gate
            .acquire()
            .await
            .map_err(|_| LlmError::network("gate closed"))?
            .forget();
        self.inner.next_response()
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }
}

// ============================================================================
// Recording reply sink
// ============================================================================

/// Reply sink that records everything it is asked to send
#[derive(Default)]
pub struct RecordingSink {
    deliveries: Mutex<Vec<(ReplyTarget, Reply)>>,
    acknowledged: Mutex<Vec<Origin>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deliveries(&self) -> Vec<(ReplyTarget, Reply)> {
        self.deliveries.lock().unwrap().clone()
    }

    pub fn acknowledged(&self) -> Vec<Origin> {
        self.acknowledged.lock().unwrap().clone()
    }

    /// Reply texts delivered to one chat, in delivery order
    pub fn texts_for(&self, chat_id: i64) -> Vec<String> {
        self.deliveries
            .lock()
            .unwrap()
            .iter()
            .filter(|(target, _)| target.chat_id == chat_id)
            .map(|(_, reply)| reply.text.clone())
            .collect()
    }

    /// Wait until `chat_id` has at least `n` replies, panicking after 5s
    pub async fn wait_for(&self, chat_id: i64, n: usize) -> Vec<String> {
        let wait = async {
            loop {
                let texts = self.texts_for(chat_id);
                if texts.len() >= n {
                    return texts;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        };
        tokio::time::timeout(Duration::from_secs(5), wait)
            .await
            .unwrap_or_else(|_| {
                panic!(
                    "timed out waiting for {n} replies in chat {chat_id}, got {:?}",
                    self.texts_for(chat_id)
                )
            })
    }
}

#[async_trait]
impl ReplySink for RecordingSink {
    async fn deliver(&self, target: &ReplyTarget, reply: &Reply) -> Result<(), String> {
        self.deliveries
            .lock()
            .unwrap()
            .push((target.clone(), reply.clone()));
        Ok(())
    }

    async fn acknowledge(&self, origin: &Origin) -> Result<(), String> {
        self.acknowledged.lock().unwrap().push(origin.clone());
        Ok(())
    }
}

// ============================================================================
// Fixed clock
// ============================================================================

pub struct FixedClock {
    date: NaiveDate,
}

impl FixedClock {
    pub fn ymd(year: i32, month: u32, day: u32) -> Self {
        Self {
            date: NaiveDate::from_ymd_opt(year, month, day).unwrap(),
        }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.date
    }
}

// ============================================================================
// Test bot
// ============================================================================

/// A runtime manager wired to mocks
pub struct TestBot<L: LlmService + 'static> {
    pub llm: Arc<L>,
    pub sink: Arc<RecordingSink>,
    pub manager: RuntimeManager,
}

impl<L: LlmService + 'static> TestBot<L> {
    pub fn with_llm(llm: L) -> Self {
        Self::build(llm, super::QUEUE_CAPACITY)
    }

    pub fn build(llm: L, queue_capacity: usize) -> Self {
        Self::assemble(llm, |manager| manager.with_queue_capacity(queue_capacity))
    }

    /// A bot whose conversation tasks stop after `idle` without events
    pub fn reaping_after(llm: L, idle: Duration) -> Self {
        Self::assemble(llm, |manager| manager.with_idle_timeout(idle))
    }

    fn assemble(llm: L, configure: impl FnOnce(RuntimeManager) -> RuntimeManager) -> Self {
        let llm = Arc::new(llm);
        let sink = Arc::new(RecordingSink::new());
        let dispatcher = Dispatcher::new(
            Arc::new(RandomDeck::seeded(7)),
            Arc::new(CompletionClient::new(llm.clone())),
            Arc::new(FixedClock::ymd(2024, 3, 15)),
        );
        let manager = RuntimeManager::new(
            Arc::new(dispatcher),
            Arc::new(InMemoryStateStore::new()),
            sink.clone(),
        );
        let manager = configure(manager);
        Self { llm, sink, manager }
    }

    pub async fn send(&self, chat_id: i64, event: Event) {
        self.manager
            .dispatch(InboundEvent {
                conversation_id: chat_id,
                origin: Origin::Message,
                event,
            })
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::FALLBACK_MESSAGE;
    use crate::menu::{self, MenuCode};
    use crate::runtime::StateStore;
    use crate::state_machine::{Command, ConvState};

    #[tokio::test]
    async fn test_mock_llm_service() {
        let llm = MockLlmService::new("test-model");
        llm.queue_response(LlmResponse::from_text("first"));

        let request = LlmRequest {
            messages: vec![],
            temperature: None,
            max_tokens: None,
        };
        assert_eq!(llm.complete(&request).await.unwrap().text, "first");
        assert!(llm.complete(&request).await.is_err());
        assert_eq!(llm.recorded_requests().len(), 2);
        assert_eq!(llm.model_id(), "test-model");
    }

    #[tokio::test]
    async fn test_start_greets_by_name() {
        let bot = TestBot::with_llm(MockLlmService::new("test-model"));
        bot.send(
            1,
            Event::Command(Command::Start {
                display_name: "Анна".to_string(),
            }),
        )
        .await;

        let texts = bot.sink.wait_for(1, 1).await;
        assert!(texts[0].contains("Анна"));
        assert!(bot.llm.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_conversations_are_isolated() {
        let bot = TestBot::with_llm(MockLlmService::new("test-model"));
        bot.llm.queue_response(LlmResponse::from_text("Львам везёт."));

        bot.send(1, Event::Menu(MenuCode::HoroscopeToday)).await;
        bot.sink.wait_for(1, 1).await;

        // Chat 2 never asked for a sign, so "Лев" is unprompted text there
        bot.send(2, Event::Text("Лев".to_string())).await;
        let texts = bot.sink.wait_for(2, 1).await;
        assert_eq!(texts, vec![menu::NEUTRAL_TEXT.to_string()]);

        bot.send(1, Event::Text("Лев".to_string())).await;
        let texts = bot.sink.wait_for(1, 3).await;
        assert_eq!(texts[1], "⭐ Составляю гороскоп для Лев...");
        assert!(texts[2].starts_with("⭐ Гороскоп для Лев"));
        assert!(texts[2].contains("Львам везёт."));
        assert_eq!(bot.llm.recorded_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_events_in_one_conversation_are_processed_in_order() {
        let bot = TestBot::with_llm(MockLlmService::new("test-model"));
        bot.llm.queue_response(LlmResponse::from_text("Сбудется."));

        bot.send(1, Event::Menu(MenuCode::Prediction)).await;
        bot.send(1, Event::Text("Сбудется ли?".to_string())).await;
        bot.send(1, Event::Menu(MenuCode::Tarot)).await;

        let texts = bot.sink.wait_for(1, 4).await;
        assert_eq!(texts[0], menu::PREDICTION_PROMPT_TEXT);
        assert_eq!(texts[1], "🔮 Заглядываю в будущее...");
        assert!(texts[2].contains("Сбудется."));
        assert_eq!(texts[3], menu::TAROT_MENU_TEXT);
    }

    #[tokio::test]
    async fn test_slow_completion_does_not_block_other_conversations() {
        let bot = TestBot::with_llm(DelayedMockLlmService::new("test-model"));
        bot.llm.queue_response(LlmResponse::from_text("Медленная карта."));

        bot.send(1, Event::Menu(MenuCode::TarotDay)).await;
        bot.llm.request_started.notified().await;

        bot.send(2, Event::Menu(MenuCode::Tarot)).await;
        let texts = bot.sink.wait_for(2, 1).await;
        assert_eq!(texts, vec![menu::TAROT_MENU_TEXT.to_string()]);

        // Chat 1 is still waiting on its reading
        assert_eq!(bot.sink.texts_for(1), vec!["🔮 Вытягиваю карту дня...".to_string()]);

        bot.llm.release(1);
        let texts = bot.sink.wait_for(1, 2).await;
        assert!(texts[1].contains("Медленная карта."));
    }

    #[tokio::test]
    async fn test_full_queue_rejects_with_busy_reply() {
        let bot = TestBot::build(DelayedMockLlmService::new("test-model"), 1);
        bot.llm.queue_response(LlmResponse::from_text("Да."));

        bot.send(1, Event::Menu(MenuCode::TarotYesNo)).await;
        bot.llm.request_started.notified().await;

        // One slot: the first tap waits, the second is turned away
        bot.manager
            .dispatch(InboundEvent {
                conversation_id: 1,
                origin: Origin::Callback {
                    message_id: 10,
                    callback_id: "cb-1".to_string(),
                },
                event: Event::Menu(MenuCode::Tarot),
            })
            .await;
        bot.send(1, Event::Menu(MenuCode::Astrology)).await;

        let texts = bot.sink.wait_for(1, 2).await;
        assert_eq!(texts[1], menu::BUSY_TEXT);
        let (busy_target, _) = bot.sink.deliveries()[1].clone();
        assert_eq!(busy_target.origin, Origin::Message);

        bot.llm.release(1);
        let texts = bot.sink.wait_for(1, 4).await;
        assert!(texts[2].contains("Да."));
        assert_eq!(texts[3], menu::TAROT_MENU_TEXT);
        assert!(!texts.contains(&menu::ASTROLOGY_MENU_TEXT.to_string()));
    }

    #[tokio::test]
    async fn test_callbacks_are_acknowledged_and_answered_in_place() {
        let bot = TestBot::with_llm(MockLlmService::new("test-model"));
        let origin = Origin::Callback {
            message_id: 55,
            callback_id: "cb-55".to_string(),
        };
        bot.manager
            .dispatch(InboundEvent {
                conversation_id: 3,
                origin: origin.clone(),
                event: Event::Menu(MenuCode::Astrology),
            })
            .await;

        bot.sink.wait_for(3, 1).await;
        assert_eq!(bot.sink.acknowledged(), vec![origin.clone()]);
        let (target, reply) = bot.sink.deliveries()[0].clone();
        assert_eq!(target.origin, origin);
        assert_eq!(reply.keyboard, Some(menu::astrology_menu()));
    }

    #[tokio::test]
    async fn test_failed_completion_returns_to_idle() {
        let bot = TestBot::with_llm(MockLlmService::new("test-model"));
        bot.llm.queue_error(LlmError::server_error("HTTP 503"));

        bot.send(1, Event::Menu(MenuCode::NatalChart)).await;
        bot.send(1, Event::Text("01.01.1990".to_string())).await;
        let texts = bot.sink.wait_for(1, 3).await;
        assert!(texts[2].contains(FALLBACK_MESSAGE));

        // Back at Idle: unprompted text gets the neutral reply
        bot.send(1, Event::Text("ещё".to_string())).await;
        let texts = bot.sink.wait_for(1, 4).await;
        assert_eq!(texts[3], menu::NEUTRAL_TEXT);
        assert_eq!(bot.manager.active_conversations().await, 1);
    }

    #[tokio::test]
    async fn test_store_tracks_pending_flow() {
        let store = Arc::new(InMemoryStateStore::new());
        let sink = Arc::new(RecordingSink::new());
        let llm = Arc::new(MockLlmService::new("test-model"));
        let dispatcher = Dispatcher::new(
            Arc::new(RandomDeck::seeded(1)),
            Arc::new(CompletionClient::new(llm)),
            Arc::new(FixedClock::ymd(2024, 3, 15)),
        );
        let manager = RuntimeManager::new(Arc::new(dispatcher), store.clone(), sink.clone());

        manager
            .dispatch(InboundEvent {
                conversation_id: 9,
                origin: Origin::Message,
                event: Event::Menu(MenuCode::Palmistry),
            })
            .await;
        sink.wait_for(9, 1).await;

        // The state is committed right after delivery
        let state = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let state = store.get_state(9).await.unwrap();
                if state != ConvState::Idle {
                    return state;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        assert_eq!(state, ConvState::AwaitingPalmInput);
    }

    #[tokio::test]
    async fn test_idle_conversations_stop_and_restart_on_next_event() {
        let bot = TestBot::reaping_after(
            MockLlmService::new("test-model"),
            Duration::from_millis(50),
        );

        for chat in 1..=20 {
            bot.send(chat, Event::Menu(MenuCode::Tarot)).await;
        }
        for chat in 1..=20 {
            bot.sink.wait_for(chat, 1).await;
        }
        // Chat 3 is left mid-flow when its task stops
        bot.send(3, Event::Menu(MenuCode::HoroscopeToday)).await;
        bot.sink.wait_for(3, 2).await;

        tokio::time::timeout(Duration::from_secs(5), async {
            while bot.manager.active_conversations().await > 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("idle conversations were not stopped");

        bot.llm
            .queue_response(LlmResponse::from_text("Звёзды благосклонны"));
        bot.send(3, Event::Text("Лев".to_string())).await;

        let texts = bot.sink.wait_for(3, 4).await;
        assert!(texts[3].starts_with("⭐ Гороскоп для Лев"));
        assert!(texts[3].contains("Звёзды благосклонны"));
        // Stopped handles are dropped when the new task is registered
        assert_eq!(bot.manager.tracked_conversations().await, 1);
    }
}
