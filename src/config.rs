use crate::llm::{Provider, ReplySettings, persona};
use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Config file picked up from the working directory when none is given.
const CWD_CONFIG_FILE: &str = "config.yaml";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Address to bind
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Disable the per-request timeout middleware
    #[arg(long, env = "TIMEOUT_DISABLED")]
    pub timeout_disabled: Option<bool>,

    /// Chat-completions API root
    #[arg(long, env = "LLM_BASE_URL")]
    pub base_url: Option<String>,

    /// Model identifier
    #[arg(long, env = "LLM_MODEL")]
    pub model: Option<String>,

    /// Bearer credential for the chat-completions API
    #[arg(long, env = "LLM_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub request_timeout_secs: u64,
    pub timeout_disabled: bool,
    pub widget_idle_secs: u64,
    pub max_widgets: usize,
}

#[derive(Deserialize, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub system_prompt: String,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    /// Build the configuration from defaults, a config file, `DATAFISH_`
    /// environment variables and CLI flags, in increasing precedence.
    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder()
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.request_timeout_secs", 60)?
            .set_default("server.timeout_disabled", false)?
            .set_default("server.widget_idle_secs", 30 * 60)?
            .set_default("server.max_widgets", 10_000)?
            .set_default("llm.base_url", persona::DEFAULT_BASE_URL)?
            .set_default("llm.model", persona::DEFAULT_MODEL)?
            .set_default("llm.system_prompt", persona::DEFAULT_SYSTEM_PROMPT)?
            .set_default("llm.timeout_secs", 30)?;

        // Explicit file must exist; the cwd fallback is optional.
        if let Some(path) = &cli.config {
            builder = builder.add_source(File::with_name(path).required(true));
        } else if Path::new(CWD_CONFIG_FILE).exists() {
            builder = builder.add_source(File::with_name(CWD_CONFIG_FILE).required(false));
        }

        // e.g. DATAFISH_SERVER__PORT=8000
        builder = builder.add_source(
            Environment::with_prefix("DATAFISH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // CLI flags (and their env bindings) win over everything above.
        if let Some(host) = cli.host {
            builder = builder.set_override("server.host", host)?;
        }
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(td) = cli.timeout_disabled {
            builder = builder.set_override("server.timeout_disabled", td)?;
        }
        if let Some(url) = cli.base_url {
            builder = builder.set_override("llm.base_url", url)?;
        }
        if let Some(model) = cli.model {
            builder = builder.set_override("llm.model", model)?;
        }
        if let Some(key) = cli.api_key {
            builder = builder.set_override("llm.api_key", key)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        url::Url::parse(&self.llm.base_url).map_err(|e| {
            config::ConfigError::Message(format!(
                "invalid llm.base_url {:?}: {e}",
                self.llm.base_url
            ))
        })?;
        if self.llm.model.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "llm.model cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Reply provider settings derived from the `llm` section.
    #[must_use]
    pub fn reply_settings(&self) -> ReplySettings {
        let api_key = self
            .llm
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty());

        ReplySettings {
            base_url: self.llm.base_url.clone(),
            api_key,
            model: self.llm.model.clone(),
            system_prompt: self.llm.system_prompt.clone(),
            provider: Provider::detect_from_url(&self.llm.base_url),
            timeout: Duration::from_secs(self.llm.timeout_secs),
        }
    }

    /// Per-request budget for the HTTP layer, or `None` when disabled.
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        (!self.server.timeout_disabled)
            .then(|| Duration::from_secs(self.server.request_timeout_secs))
    }

    /// How long a widget may sit unused before the store drops it.
    #[must_use]
    pub fn widget_idle_ttl(&self) -> Duration {
        Duration::from_secs(self.server.widget_idle_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_defaults() {
        let cfg = AppConfig::load_from_args([
            "datafish-chat",
            "--port",
            "4100",
            "--model",
            "mistral-small",
            "--api-key",
            "k",
        ])
        .unwrap();
        assert_eq!(cfg.server.port, 4100);
        assert_eq!(cfg.llm.model, "mistral-small");
        assert_eq!(cfg.reply_settings().api_key.as_deref(), Some("k"));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let err = AppConfig::load_from_args(["datafish-chat", "--base-url", "not a url"])
            .unwrap_err();
        assert!(err.to_string().contains("llm.base_url"));
    }

    #[test]
    fn test_blank_api_key_treated_as_absent() {
        let cfg = AppConfig::load_from_args(["datafish-chat", "--api-key", "  "]).unwrap();
        assert!(cfg.reply_settings().api_key.is_none());
    }

    #[test]
    fn test_timeout_disabled() {
        let cfg =
            AppConfig::load_from_args(["datafish-chat", "--timeout-disabled", "true"]).unwrap();
        assert!(cfg.request_timeout().is_none());
    }
}
