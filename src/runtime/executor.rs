//! Conversation runtime executor

use super::traits::{ReplySink, ReplyTarget, StateStore};
use super::InboundEvent;
use crate::dispatcher::Dispatcher;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// One conversation's task: handles its events strictly one at a time
pub struct ConversationRuntime<S, K>
where
    S: StateStore + 'static,
    K: ReplySink + 'static,
{
    conversation_id: i64,
    dispatcher: Arc<Dispatcher>,
    store: S,
    sink: K,
    event_rx: mpsc::Receiver<InboundEvent>,
    idle_timeout: Duration,
}

impl<S, K> ConversationRuntime<S, K>
where
    S: StateStore + 'static,
    K: ReplySink + 'static,
{
    pub fn new(
        conversation_id: i64,
        dispatcher: Arc<Dispatcher>,
        store: S,
        sink: K,
        event_rx: mpsc::Receiver<InboundEvent>,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            conversation_id,
            dispatcher,
            store,
            sink,
            event_rx,
            idle_timeout,
        }
    }

    pub async fn run(mut self) {
        tracing::debug!(conversation_id = self.conversation_id, "Starting conversation runtime");

        loop {
            match tokio::time::timeout(self.idle_timeout, self.event_rx.recv()).await {
                Ok(Some(inbound)) => self.handle_logged(inbound).await,
                Ok(None) => break,
                Err(_) => {
                    tracing::debug!(
                        conversation_id = self.conversation_id,
                        idle_secs = self.idle_timeout.as_secs(),
                        "Conversation idle"
                    );
                    // Senders see the queue as closed from here on and start
                    // a new task; anything already queued is still handled.
                    self.event_rx.close();
                    while let Some(inbound) = self.event_rx.recv().await {
                        self.handle_logged(inbound).await;
                    }
                    break;
                }
            }
        }

        tracing::debug!(conversation_id = self.conversation_id, "Conversation runtime stopped");
    }

    async fn handle_logged(&self, inbound: InboundEvent) {
        if let Err(e) = self.process_event(inbound).await {
            tracing::error!(
                conversation_id = self.conversation_id,
                error = %e,
                "Error handling event"
            );
        }
    }

    async fn process_event(&self, inbound: InboundEvent) -> Result<(), String> {
        let state = self.store.get_state(self.conversation_id).await?;
        let event_kind = inbound.event.kind();
        let target = ReplyTarget {
            chat_id: self.conversation_id,
            origin: inbound.origin,
        };

        // Replies are delivered while the dispatcher is still working, so a
        // progress notice reaches the user before the completion returns.
        let (reply_tx, mut reply_rx) = mpsc::unbounded_channel();
        let dispatch = self
            .dispatcher
            .handle_streaming(state, inbound.event, reply_tx);
        let deliver = async {
            let mut failures = 0usize;
            while let Some(reply) = reply_rx.recv().await {
                if let Err(e) = self.sink.deliver(&target, &reply).await {
                    failures += 1;
                    tracing::warn!(
                        conversation_id = self.conversation_id,
                        error = %e,
                        "Failed to deliver reply"
                    );
                }
            }
            failures
        };
        let (new_state, failures) = tokio::join!(dispatch, deliver);

        // State advances even if delivery failed; the user can always
        // recover with the menu or /start.
        self.store
            .update_state(self.conversation_id, new_state)
            .await?;

        if new_state == state {
            tracing::debug!(
                conversation_id = self.conversation_id,
                state = state.name(),
                event = event_kind,
                "Event handled"
            );
        } else {
            tracing::info!(
                conversation_id = self.conversation_id,
                from = state.name(),
                to = new_state.name(),
                event = event_kind,
                "State transition"
            );
        }

        if failures > 0 {
            return Err(format!("{failures} replies could not be delivered"));
        }
        Ok(())
    }
}
