//! Reply provider contract and its chat-completions implementation.
//!
//! The chat widget never talks to the network directly. It asks a
//! [`ReplyProvider`] for the bot's answer to one user turn, and the provider
//! always resolves to displayable text: upstream failures are folded into a
//! fixed, category-specific fallback string.
//!
//! # Providers
//!
//! - [`ChatCompletionsProvider`]: `OpenAI`-compatible `/v1/chat/completions`
//!   endpoint (Mistral by default)
//!
//! # Example
//!
//! ```rust,ignore
//! use datafish_chat::llm::{ChatCompletionsProvider, ReplyProvider, ReplySettings};
//!
//! let provider = ChatCompletionsProvider::new(ReplySettings::default())?;
//! let reply = provider.get_reply("Bonjour").await;
//! ```

pub mod chat_completions;
pub mod persona;
pub mod provider;

use std::time::Duration;

pub use chat_completions::ChatCompletionsProvider;
pub use provider::Provider;

/// Fallback shown when the reply service cannot be reached.
pub const FALLBACK_UNREACHABLE: &str = "Désolé, je n'arrive pas à joindre le service IA.";

/// Fallback shown when the reply service answers with a non-success status.
pub const FALLBACK_ERROR: &str = "Désolé, une erreur est survenue.";

/// Fallback shown when the reply payload lacks usable reply text.
pub const FALLBACK_NOT_UNDERSTOOD: &str = "Désolé, je n'ai pas compris.";

/// Connection and model settings for the reply service.
#[derive(Clone)]
pub struct ReplySettings {
    /// Base URL of the chat-completions API (e.g., `https://api.mistral.ai`).
    pub base_url: String,
    /// Bearer credential. Held server-side only.
    pub api_key: Option<String>,
    /// Model identifier (e.g., `mistral-tiny`).
    pub model: String,
    /// System instruction sent ahead of every user turn.
    pub system_prompt: String,
    /// Provider type, detected from `base_url`.
    pub provider: Provider,
    /// Upper bound on one round trip.
    pub timeout: Duration,
}

impl std::fmt::Debug for ReplySettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplySettings")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("provider", &self.provider)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Default for ReplySettings {
    fn default() -> Self {
        Self {
            base_url: persona::DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model: persona::DEFAULT_MODEL.to_string(),
            system_prompt: persona::DEFAULT_SYSTEM_PROMPT.to_string(),
            provider: Provider::detect_from_url(persona::DEFAULT_BASE_URL),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Role of a message author on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instruction.
    System,
    /// User input.
    User,
    /// Model output.
    Assistant,
}

/// Why a reply could not be obtained.
///
/// Each variant maps to exactly one user-facing fallback string, see
/// [`ReplyError::fallback`].
#[derive(Debug, thiserror::Error)]
pub enum ReplyError {
    /// The request never produced a response (DNS, connect, timeout, reset).
    #[error("reply service unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success HTTP status.
    #[error("reply service returned HTTP {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// The body was not JSON or did not carry `choices[0].message.content`.
    #[error("reply payload not understood: {0}")]
    Payload(String),
}

impl ReplyError {
    /// The French user-facing text substituted for a failed reply.
    #[must_use]
    pub fn fallback(&self) -> &'static str {
        match self {
            Self::Transport(_) => FALLBACK_UNREACHABLE,
            Self::Status { .. } => FALLBACK_ERROR,
            Self::Payload(_) => FALLBACK_NOT_UNDERSTOOD,
        }
    }

    /// Short category name for structured logs.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Status { .. } => "status",
            Self::Payload(_) => "payload",
        }
    }
}

/// Source of bot replies for single user turns.
///
/// Implementors provide [`try_reply`](ReplyProvider::try_reply); callers use
/// [`get_reply`](ReplyProvider::get_reply), which never fails.
#[async_trait::async_trait]
pub trait ReplyProvider: Send + Sync {
    /// Ask the service for a reply to `user_text`.
    ///
    /// # Errors
    ///
    /// Returns the [`ReplyError`] category describing why no reply text was
    /// obtained.
    async fn try_reply(&self, user_text: &str) -> Result<String, ReplyError>;

    /// Ask the service for a reply, substituting the category fallback on
    /// failure.
    async fn get_reply(&self, user_text: &str) -> String {
        match self.try_reply(user_text).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(
                    name: "llm.reply.failed",
                    category = e.category(),
                    error = %e,
                    "Reply provider failed, using fallback"
                );
                e.fallback().to_string()
            }
        }
    }
}
