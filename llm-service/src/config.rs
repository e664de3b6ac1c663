//! Completion-service configuration.

use crate::errors::{
    ConfigError, Result, env_opt_f32, env_opt_u32, must_env, validate_http_endpoint,
    validate_range_f32,
};

/// Configuration for the chat-completion model invocation.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Model identifier (e.g. `"gpt-4o-mini"`).
    pub model: String,
    /// API base, e.g. `"https://api.openai.com"`.
    pub endpoint: String,
    pub api_key: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    /// Request timeout in seconds (default 60).
    pub timeout_secs: Option<u64>,
}

impl CompletionConfig {
    /// Loads configuration from environment variables.
    ///
    /// Required: `OPENAI_API_KEY`. Optional with defaults: `OPENAI_MODEL`
    /// (gpt-4o-mini), `OPENAI_API_BASE`, `LLM_TEMPERATURE` (0.3),
    /// `LLM_MAX_TOKENS`, `LLM_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        let cfg = Self {
            model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into()),
            endpoint: std::env::var("OPENAI_API_BASE")
                .unwrap_or_else(|_| "https://api.openai.com".into()),
            api_key: must_env("OPENAI_API_KEY")?,
            max_tokens: env_opt_u32("LLM_MAX_TOKENS")?,
            temperature: env_opt_f32("LLM_TEMPERATURE")?.or(Some(0.3)),
            top_p: None,
            timeout_secs: env_opt_u32("LLM_TIMEOUT_SECS")?.map(u64::from),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates field formats and ranges.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel.into());
        }
        validate_http_endpoint("OPENAI_API_BASE", &self.endpoint)?;
        if let Some(t) = self.temperature {
            validate_range_f32("temperature", t, 0.0, 2.0)?;
        }
        if let Some(p) = self.top_p {
            validate_range_f32("top_p", p, 0.0, 1.0)?;
        }
        Ok(())
    }
}
