//! Text-generation backend
//!
//! Readings reach the model through [`CompletionClient`], which sits on an
//! [`LlmService`] (the DeepSeek client wrapped in [`LoggingService`]).

mod completion;
mod error;
mod openai;
mod types;

pub use completion::{CompletionClient, FALLBACK_MESSAGE, MAX_TOKENS, TEMPERATURE};
pub use error::{LlmError, LlmErrorKind};
pub use openai::OpenAIService;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait LlmService: Send + Sync {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Model name sent with each request
    fn model_id(&self) -> &str;
}

/// Records latency and token usage of every completion call
pub struct LoggingService {
    inner: Arc<dyn LlmService>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn LlmService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl LlmService for LoggingService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = std::time::Instant::now();
        let result = self.inner.complete(request).await;
        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        // Failures are reported by the caller, which knows the fallback
        match &result {
            Ok(response) => tracing::info!(
                model = %self.model_id,
                elapsed_ms,
                input_tokens = response.usage.input_tokens,
                output_tokens = response.usage.output_tokens,
                finish_reason = response.finish_reason.as_deref().unwrap_or("unknown"),
                "Completion finished"
            ),
            Err(e) => tracing::debug!(
                model = %self.model_id,
                elapsed_ms,
                kind = e.kind.name(),
                "Completion call failed"
            ),
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
