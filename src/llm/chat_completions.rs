//! Chat Completions API reply provider.
//!
//! This module implements [`ReplyProvider`] for the `OpenAI`-compatible Chat
//! Completions API (`/v1/chat/completions`). Each turn is a single,
//! non-streaming request carrying the persona and the latest user message.

use serde::Serialize;

use super::{MessageRole, ReplyError, ReplyProvider, ReplySettings};

/// One entry of the request's `messages` array.
#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: MessageRole,
    content: &'a str,
}

/// Request body for `/v1/chat/completions`.
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [WireMessage<'a>; 2],
}

/// Provider for the Chat Completions API.
///
/// Holds its own `reqwest::Client` configured with the settings' timeout.
#[derive(Clone)]
pub struct ChatCompletionsProvider {
    http: reqwest::Client,
    settings: ReplySettings,
    url: String,
}

impl std::fmt::Debug for ChatCompletionsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsProvider")
            .field("url", &self.url)
            .field("settings", &self.settings)
            .finish()
    }
}

impl ChatCompletionsProvider {
    /// Create a provider with the given settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built (e.g., TLS backend
    /// initialization failure).
    pub fn new(settings: ReplySettings) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        Ok(Self::with_client(settings, http))
    }

    /// Create a provider around an existing HTTP client.
    #[must_use]
    pub fn with_client(settings: ReplySettings, http: reqwest::Client) -> Self {
        let url = settings.provider.build_chat_url(&settings.base_url);
        Self {
            http,
            settings,
            url,
        }
    }

    /// The resolved chat completions endpoint.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl ReplyProvider for ChatCompletionsProvider {
    async fn try_reply(&self, user_text: &str) -> Result<String, ReplyError> {
        let body = CompletionRequest {
            model: &self.settings.model,
            messages: [
                WireMessage {
                    role: MessageRole::System,
                    content: &self.settings.system_prompt,
                },
                WireMessage {
                    role: MessageRole::User,
                    content: user_text,
                },
            ],
        };

        let mut rb = self.http.post(&self.url).json(&body);
        if let Some(k) = &self.settings.api_key {
            rb = rb.bearer_auth(k);
        }

        let resp = rb.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ReplyError::Status {
                status: status.as_u16(),
            });
        }

        let bytes = resp.bytes().await?;
        let reply = extract_reply(&bytes)?;

        tracing::debug!(
            name: "llm.reply.received",
            provider = self.settings.provider.name(),
            model = %self.settings.model,
            chars = reply.chars().count(),
            "Reply received"
        );

        Ok(reply)
    }
}

/// Pull `choices[0].message.content` out of a completion body, trimmed.
///
/// # Errors
///
/// Returns [`ReplyError::Payload`] if the body is not JSON, the path is
/// missing, or the content is not a non-empty string. Whitespace-only content
/// is a reply, trimmed to the empty string.
pub fn extract_reply(body: &[u8]) -> Result<String, ReplyError> {
    let v: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| ReplyError::Payload(e.to_string()))?;

    let content = v
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| ReplyError::Payload("missing choices[0].message.content".to_string()))?;

    if content.is_empty() {
        return Err(ReplyError::Payload("empty reply content".to_string()));
    }
    Ok(content.trim().to_string())
}
