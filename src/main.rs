//! Datafish chatbot server
//!
//! Entry point: loads configuration, builds the reply provider and serves
//! the widget API.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use datafish_chat::config::AppConfig;
use datafish_chat::llm::{ChatCompletionsProvider, ReplyProvider};
use datafish_chat::server::start_server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (M-LOG-STRUCTURED)
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load .env (if present)
    let _ = dotenv();

    let config = Arc::new(AppConfig::load()?);
    let settings = config.reply_settings();

    info!(
        name: "llm.config.loaded",
        base_url = %settings.base_url,
        provider = settings.provider.name(),
        model = %settings.model,
        has_api_key = settings.api_key.is_some(),
        "LLM configuration loaded"
    );
    if settings.api_key.is_none() {
        tracing::warn!("No LLM API key configured; upstream calls will be unauthenticated");
    }

    let provider: Arc<dyn ReplyProvider> = Arc::new(ChatCompletionsProvider::new(settings)?);

    start_server(config, provider).await
}
