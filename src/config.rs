//! Process configuration loaded from the environment
//!
//! The bot token is mandatory. The LLM key is not: without it every
//! completion fails and the user sees the fallback message.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_LLM_BASE_URL: &str = "https://api.deepseek.com";
const DEFAULT_LLM_MODEL: &str = "deepseek-chat";
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;

/// Startup configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TELEGRAM_BOT_TOKEN is not set in the environment")]
    MissingBotToken,
    #[error("{name} must be a positive integer number of seconds, got {value:?}")]
    InvalidSeconds { name: &'static str, value: String },
}

/// Configuration for the completion endpoint
#[derive(Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS),
        }
    }
}

/// Configuration for the Telegram transport
#[derive(Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Long-poll timeout passed to `getUpdates`
    pub poll_timeout: Duration,
}

// Secrets are redacted so configs can be logged safely

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .field("poll_timeout", &self.poll_timeout)
            .finish()
    }
}

/// Full bot configuration
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub telegram: TelegramConfig,
    pub llm: LlmConfig,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// Empty values are treated the same as missing ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let bot_token = var("TELEGRAM_BOT_TOKEN").ok_or(ConfigError::MissingBotToken)?;

        let llm = LlmConfig {
            api_key: var("DEEPSEEK_API_KEY"),
            base_url: var("DEEPSEEK_BASE_URL")
                .unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
            model: var("DEEPSEEK_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            timeout: seconds(
                "LLM_TIMEOUT_SECS",
                var("LLM_TIMEOUT_SECS"),
                DEFAULT_LLM_TIMEOUT_SECS,
            )?,
        };

        let telegram = TelegramConfig {
            bot_token,
            poll_timeout: seconds(
                "TELEGRAM_POLL_TIMEOUT_SECS",
                var("TELEGRAM_POLL_TIMEOUT_SECS"),
                DEFAULT_POLL_TIMEOUT_SECS,
            )?,
        };

        Ok(Self { telegram, llm })
    }
}

fn seconds(name: &'static str, value: Option<String>, default: u64) -> Result<Duration, ConfigError> {
    let Some(raw) = value else {
        return Ok(Duration::from_secs(default));
    };
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidSeconds { name, value: raw }),
    }
}
