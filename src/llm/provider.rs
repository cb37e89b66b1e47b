//! Provider detection and endpoint construction.
//!
//! All supported providers speak the `OpenAI`-compatible chat-completions
//! dialect; they differ only in host, which is what we log.

/// Supported chat-completion providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// Mistral AI (api.mistral.ai)
    Mistral,
    /// `OpenAI` (api.openai.com)
    OpenAI,
    /// `OpenRouter` (openrouter.ai)
    OpenRouter,
    /// Groq (groq.com)
    Groq,
    /// Generic OpenAI-compatible provider
    Generic,
}

impl Provider {
    /// Detect provider from base URL.
    ///
    /// # Example
    ///
    /// ```rust
    /// use datafish_chat::llm::Provider;
    ///
    /// let provider = Provider::detect_from_url("https://api.mistral.ai");
    /// assert_eq!(provider, Provider::Mistral);
    /// ```
    #[must_use]
    pub fn detect_from_url(base_url: &str) -> Self {
        let lower = base_url.to_lowercase();

        if lower.contains("mistral.ai") {
            Self::Mistral
        } else if lower.contains("openrouter.ai") {
            Self::OpenRouter
        } else if lower.contains("groq.com") {
            Self::Groq
        } else if lower.contains("openai.com") {
            Self::OpenAI
        } else {
            Self::Generic
        }
    }

    /// Stable name for logs.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Mistral => "mistral",
            Self::OpenAI => "openai",
            Self::OpenRouter => "openrouter",
            Self::Groq => "groq",
            Self::Generic => "generic",
        }
    }

    /// Build the chat completions URL.
    ///
    /// A base that already names the endpoint is used as is; a base ending
    /// in `/v1` only gets `/chat/completions` appended.
    #[must_use]
    pub fn build_chat_url(self, base_url: &str) -> String {
        let base = base_url.trim_end_matches('/');

        if base.ends_with("/chat/completions") {
            base.to_string()
        } else if base.ends_with("/v1") {
            format!("{base}/chat/completions")
        } else {
            format!("{base}/v1/chat/completions")
        }
    }
}
