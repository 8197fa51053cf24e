//! Completion errors

use thiserror::Error;

/// A failed completion call
#[derive(Debug, Error)]
#[error("{message}")]
pub struct LlmError {
    pub kind: LlmErrorKind,
    pub message: String,
}

impl LlmError {
    pub fn new(kind: LlmErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Network, message)
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::RateLimit, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::ServerError, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Auth, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::InvalidRequest, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::MalformedResponse, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Unknown, message)
    }
}

/// What went wrong with a completion call.
///
/// Every kind ends in the same fallback reply; the kind decides how loudly
/// that gets logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// Connection failure or timeout
    Network,
    /// 429 from the provider
    RateLimit,
    /// 5xx from the provider
    ServerError,
    /// Missing or rejected API key (401, 403)
    Auth,
    /// Provider rejected the request shape (400)
    InvalidRequest,
    /// 2xx response without usable content
    MalformedResponse,
    Unknown,
}

impl LlmErrorKind {
    /// The bot's setup is wrong, so every reading will fail until someone
    /// changes the key, model or base URL.
    pub fn needs_operator(self) -> bool {
        matches!(self, Self::Auth | Self::InvalidRequest)
    }

    /// Stable name for logs
    pub fn name(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::RateLimit => "rate_limit",
            Self::ServerError => "server_error",
            Self::Auth => "auth",
            Self::InvalidRequest => "invalid_request",
            Self::MalformedResponse => "malformed_response",
            Self::Unknown => "unknown",
        }
    }
}
