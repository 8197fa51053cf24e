//! Runtime for executing conversations
//!
//! Each conversation (one Telegram chat) gets its own task with a bounded
//! queue. Events for one chat are handled in arrival order; a slow reading
//! in one chat never delays another. A task stops after sitting idle and is
//! started again by the chat's next event; the chat's state lives in the
//! [`StateStore`], not in the task.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::ConversationRuntime;
pub use traits::*;

use crate::dispatcher::Dispatcher;
use crate::menu::{self, Reply};
use crate::state_machine::Event;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};

/// Events a conversation may have waiting behind the one in progress
pub const QUEUE_CAPACITY: usize = 8;

/// How long a conversation task waits for its next event before stopping
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(600);

/// An event addressed to one conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub conversation_id: i64,
    pub origin: Origin,
    pub event: Event,
}

/// Handle to interact with a running conversation
#[derive(Clone)]
pub struct ConversationHandle {
    pub event_tx: mpsc::Sender<InboundEvent>,
}

/// Manager for all conversation runtimes
pub struct RuntimeManager {
    dispatcher: Arc<Dispatcher>,
    store: Arc<dyn StateStore>,
    sink: Arc<dyn ReplySink>,
    queue_capacity: usize,
    idle_timeout: Duration,
    runtimes: RwLock<HashMap<i64, ConversationHandle>>,
}

impl RuntimeManager {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        store: Arc<dyn StateStore>,
        sink: Arc<dyn ReplySink>,
    ) -> Self {
        Self {
            dispatcher,
            store,
            sink,
            queue_capacity: QUEUE_CAPACITY,
            idle_timeout: IDLE_TIMEOUT,
            runtimes: RwLock::new(HashMap::new()),
        }
    }

    #[cfg(test)]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    #[cfg(test)]
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Get or create a runtime for a conversation
    pub async fn get_or_create(&self, conversation_id: i64) -> ConversationHandle {
        // Check if already running
        {
            let runtimes = self.runtimes.read().await;
            if let Some(handle) = runtimes.get(&conversation_id) {
                if !handle.event_tx.is_closed() {
                    return handle.clone();
                }
            }
        }

        let mut runtimes = self.runtimes.write().await;
        // Another event may have started it while we waited for the lock
        if let Some(handle) = runtimes.get(&conversation_id) {
            if !handle.event_tx.is_closed() {
                return handle.clone();
            }
            tracing::debug!(conversation_id, "Conversation runtime stopped, restarting");
        }

        // Drop handles of tasks that stopped on their own
        let before = runtimes.len();
        runtimes.retain(|_, handle| !handle.event_tx.is_closed());
        if runtimes.len() < before {
            tracing::debug!(pruned = before - runtimes.len(), "Pruned stopped conversations");
        }

        let (event_tx, event_rx) = mpsc::channel(self.queue_capacity);
        let runtime = ConversationRuntime::new(
            conversation_id,
            self.dispatcher.clone(),
            self.store.clone(),
            self.sink.clone(),
            event_rx,
            self.idle_timeout,
        );

        tokio::spawn(async move {
            runtime.run().await;
        });

        let handle = ConversationHandle { event_tx };
        runtimes.insert(conversation_id, handle.clone());
        handle
    }

    /// Route an event to its conversation.
    ///
    /// Never blocks on the conversation: when its queue is full the event is
    /// dropped and the user is asked to wait.
    pub async fn dispatch(&self, inbound: InboundEvent) {
        let conversation_id = inbound.conversation_id;

        if let Err(e) = self.sink.acknowledge(&inbound.origin).await {
            tracing::warn!(conversation_id, error = %e, "Failed to acknowledge event");
        }

        let handle = self.get_or_create(conversation_id).await;
        let inbound = match handle.event_tx.try_send(inbound) {
            Ok(()) => return,
            Err(TrySendError::Full(inbound)) => {
                tracing::info!(
                    conversation_id,
                    event = inbound.event.kind(),
                    "Conversation busy, rejecting event"
                );
                self.reply_busy(conversation_id).await;
                return;
            }
            Err(TrySendError::Closed(inbound)) => inbound,
        };

        // The task exited between lookup and send; start a fresh one
        let handle = self.get_or_create(conversation_id).await;
        if let Err(e) = handle.event_tx.try_send(inbound) {
            tracing::error!(conversation_id, error = %e, "Failed to enqueue event");
        }
    }

    async fn reply_busy(&self, conversation_id: i64) {
        // Always a new message, so the menu the user tapped stays intact
        let target = ReplyTarget {
            chat_id: conversation_id,
            origin: Origin::Message,
        };
        if let Err(e) = self.sink.deliver(&target, &Reply::text(menu::BUSY_TEXT)).await {
            tracing::warn!(conversation_id, error = %e, "Failed to deliver busy notice");
        }
    }

    /// Number of conversations with a live task
    pub async fn active_conversations(&self) -> usize {
        self.runtimes
            .read()
            .await
            .values()
            .filter(|h| !h.event_tx.is_closed())
            .count()
    }

    /// Handles held in the map, stopped or not
    #[cfg(test)]
    pub async fn tracked_conversations(&self) -> usize {
        self.runtimes.read().await.len()
    }
}
