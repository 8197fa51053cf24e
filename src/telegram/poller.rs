//! Long-polling update loop

use super::{MessageApi, TelegramClient};
use crate::runtime::RuntimeManager;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const MIN_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Poll until `shutdown` is cancelled, handing each update to the manager.
///
/// Dispatch never waits on a conversation, so a slow reading does not hold
/// up polling.
pub async fn run_polling(
    client: Arc<TelegramClient>,
    manager: Arc<RuntimeManager>,
    poll_timeout: Duration,
    shutdown: CancellationToken,
) {
    let mut offset = 0i64;
    let mut backoff = MIN_BACKOFF;

    tracing::info!(poll_timeout_secs = poll_timeout.as_secs(), "Polling for updates");

    loop {
        let updates = tokio::select! {
            () = shutdown.cancelled() => break,
            result = client.get_updates(offset, poll_timeout) => result,
        };

        let updates = match updates {
            Ok(updates) => {
                backoff = MIN_BACKOFF;
                updates
            }
            Err(e) => {
                let wait = e.retry_after().map_or(backoff, Duration::from_secs);
                tracing::warn!(error = %e, wait_secs = wait.as_secs(), "getUpdates failed");
                backoff = (backoff * 2).min(MAX_BACKOFF);
                tokio::select! {
                    () = shutdown.cancelled() => break,
                    () = tokio::time::sleep(wait) => continue,
                }
            }
        };

        for update in updates {
            // Acknowledged even if handling fails, so a bad update is not
            // redelivered forever
            offset = offset.max(update.update_id + 1);
            let update_id = update.update_id;

            if let Some(callback_id) = update.orphan_callback_id() {
                if let Err(e) = client.answer_callback_query(callback_id).await {
                    tracing::debug!(update_id, error = %e, "Failed to answer orphan callback");
                }
            }

            match update.into_inbound() {
                Some(inbound) => {
                    tracing::debug!(
                        update_id,
                        conversation_id = inbound.conversation_id,
                        event = inbound.event.kind(),
                        "Update received"
                    );
                    manager.dispatch(inbound).await;
                }
                None => tracing::debug!(update_id, "Skipping unhandled update"),
            }
        }
    }

    tracing::info!("Polling stopped");
}
