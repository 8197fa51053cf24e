//! Mystic Oracle - Telegram divination bot
//!
//! Menu taps and free text are routed through a per-chat state machine to
//! persona prompts, which an OpenAI-compatible model turns into tarot
//! readings, horoscopes, palmistry and predictions.

mod config;
mod deck;
mod dispatcher;
mod llm;
mod menu;
mod prompts;
mod runtime;
mod state_machine;
mod telegram;
mod zodiac;

use config::BotConfig;
use deck::RandomDeck;
use dispatcher::{Dispatcher, SystemClock};
use llm::{CompletionClient, LoggingService, OpenAIService};
use runtime::{InMemoryStateStore, RuntimeManager};
use std::sync::Arc;
use telegram::{TelegramClient, TelegramSink};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is fine; the environment may already be populated
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mystic_oracle=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = BotConfig::from_env().inspect_err(|e| {
        tracing::error!(error = %e, "Invalid configuration");
    })?;

    menu::validate_menus().inspect_err(|e| {
        tracing::error!(error = %e, "Menu table is inconsistent");
    })?;

    // Completion backend
    let openai = OpenAIService::new(&config.llm)?;
    if openai.has_api_key() {
        tracing::info!(
            model = %config.llm.model,
            base_url = %config.llm.base_url,
            timeout_secs = config.llm.timeout.as_secs(),
            "Completion backend configured"
        );
    } else {
        tracing::warn!("DEEPSEEK_API_KEY is not set; every reading will use the fallback message");
    }
    let completion = Arc::new(CompletionClient::new(Arc::new(LoggingService::new(
        Arc::new(openai),
    ))));

    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(RandomDeck::from_entropy()),
        completion,
        Arc::new(SystemClock),
    ));

    // Telegram transport
    let client = Arc::new(TelegramClient::new(&config.telegram)?);
    let me = client.get_me().await.inspect_err(|e| {
        tracing::error!(error = %e, "Telegram rejected the bot token");
    })?;
    tracing::info!(bot = %me.first_name, "Connected to Telegram");

    let manager = Arc::new(RuntimeManager::new(
        dispatcher,
        Arc::new(InMemoryStateStore::new()),
        Arc::new(TelegramSink::new(client.clone())),
    ));

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Shutdown requested");
                    shutdown.cancel();
                }
                Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl-C"),
            }
        }
    });

    telegram::run_polling(
        client,
        manager.clone(),
        config.telegram.poll_timeout,
        shutdown,
    )
    .await;

    tracing::info!(
        conversations = manager.active_conversations().await,
        "Mystic Oracle stopped"
    );
    Ok(())
}
