//! Fixed-parameter completion client used by every reading
//!
//! Never fails at the interface: provider errors are logged and replaced by
//! [`FALLBACK_MESSAGE`].

use super::{LlmMessage, LlmRequest, LlmService};
use std::sync::Arc;

/// Shown in place of a reading when the backend is unavailable
pub const FALLBACK_MESSAGE: &str =
    "Извините, произошла ошибка при обращении к магическим силам. Попробуйте позже.";

pub const TEMPERATURE: f32 = 0.9;
pub const MAX_TOKENS: u32 = 1500;

pub struct CompletionClient {
    llm: Arc<dyn LlmService>,
}

impl CompletionClient {
    pub fn new(llm: Arc<dyn LlmService>) -> Self {
        Self { llm }
    }

    /// Generate text for a (system, user) prompt pair.
    pub async fn generate(&self, system_prompt: &str, user_prompt: &str) -> String {
        let request = LlmRequest {
            messages: vec![
                LlmMessage::system(system_prompt),
                LlmMessage::user(user_prompt),
            ],
            temperature: Some(TEMPERATURE),
            max_tokens: Some(MAX_TOKENS),
        };

        match self.llm.complete(&request).await {
            Ok(response) => response.text,
            Err(e) if e.kind.needs_operator() => {
                tracing::error!(
                    model = %self.llm.model_id(),
                    error = %e,
                    kind = e.kind.name(),
                    "Completion backend misconfigured, answering with fallback"
                );
                FALLBACK_MESSAGE.to_string()
            }
            Err(e) => {
                tracing::warn!(
                    model = %self.llm.model_id(),
                    error = %e,
                    kind = e.kind.name(),
                    "Completion failed, answering with fallback"
                );
                FALLBACK_MESSAGE.to_string()
            }
        }
    }
}
