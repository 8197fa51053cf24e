//! Trait abstractions for runtime I/O
//!
//! These traits let the executor run against in-memory fakes in tests and
//! against Telegram in production.

use crate::menu::Reply;
use crate::state_machine::ConvState;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Where an inbound event came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// A typed message, photo or command
    Message,
    /// An inline button tap on a message the bot sent
    Callback {
        message_id: i64,
        callback_id: String,
    },
}

/// Destination for replies to one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyTarget {
    pub chat_id: i64,
    pub origin: Origin,
}

/// Storage for per-conversation state
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Current state, `Idle` for conversations never seen before
    async fn get_state(&self, conv_id: i64) -> Result<ConvState, String>;

    async fn update_state(&self, conv_id: i64, state: ConvState) -> Result<(), String>;
}

/// Outbound side of the transport
#[async_trait]
pub trait ReplySink: Send + Sync {
    /// Deliver one reply. Callback origins edit the tapped message in place.
    async fn deliver(&self, target: &ReplyTarget, reply: &Reply) -> Result<(), String>;

    /// Acknowledge receipt of an event (clears the button spinner for taps)
    async fn acknowledge(&self, origin: &Origin) -> Result<(), String>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: StateStore + ?Sized> StateStore for Arc<T> {
    async fn get_state(&self, conv_id: i64) -> Result<ConvState, String> {
        (**self).get_state(conv_id).await
    }

    async fn update_state(&self, conv_id: i64, state: ConvState) -> Result<(), String> {
        (**self).update_state(conv_id, state).await
    }
}

#[async_trait]
impl<T: ReplySink + ?Sized> ReplySink for Arc<T> {
    async fn deliver(&self, target: &ReplyTarget, reply: &Reply) -> Result<(), String> {
        (**self).deliver(target, reply).await
    }

    async fn acknowledge(&self, origin: &Origin) -> Result<(), String> {
        (**self).acknowledge(origin).await
    }
}

// ============================================================================
// In-memory state store
// ============================================================================

/// Process-lifetime state store; all conversations restart at `Idle`
#[derive(Default)]
pub struct InMemoryStateStore {
    states: RwLock<HashMap<i64, ConvState>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn get_state(&self, conv_id: i64) -> Result<ConvState, String> {
        Ok(self
            .states
            .read()
            .await
            .get(&conv_id)
            .copied()
            .unwrap_or_default())
    }

    async fn update_state(&self, conv_id: i64, state: ConvState) -> Result<(), String> {
        let mut states = self.states.write().await;
        // Idle is the default; dropping it keeps the map bounded by
        // conversations that are mid-flow.
        if state == ConvState::Idle {
            states.remove(&conv_id);
        } else {
            states.insert(conv_id, state);
        }
        Ok(())
    }
}
