//! OpenAI chat-completion client.
//!
//! Minimal, non-streaming wrapper around
//! `POST {endpoint}/v1/chat/completions`.
//!
//! Constructor validation:
//! - `cfg.api_key` must be non-empty
//! - `cfg.endpoint` must start with http:// or https://
//!
//! Errors are normalized via the unified types in `errors`.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use umpire_core::completion::TextCompletion;
use umpire_core::errors::SourceError;

use crate::config::CompletionConfig;
use crate::errors::{ConfigError, LlmError, make_snippet, validate_http_endpoint};

/// Thin client for the OpenAI chat-completions API.
///
/// Constructed once from a validated [`CompletionConfig`]; internally keeps
/// a preconfigured `reqwest::Client` with timeout and default headers.
#[derive(Debug)]
pub struct CompletionService {
    client: reqwest::Client,
    cfg: CompletionConfig,
    url_chat: String,
}

impl CompletionService {
    /// Creates a new [`CompletionService`] from the given config.
    ///
    /// # Errors
    /// - [`LlmError::Config`] if the API key is empty or the endpoint scheme
    ///   is invalid
    /// - [`LlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: CompletionConfig) -> Result<Self, LlmError> {
        if cfg.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey.into());
        }
        validate_http_endpoint("OPENAI_API_BASE", &cfg.endpoint)?;

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", cfg.api_key)).map_err(|e| {
                LlmError::Decode(format!("invalid API key header: {e}"))
            })?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let url_chat = format!("{}/v1/chat/completions", cfg.endpoint.trim_end_matches('/'));

        info!(
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = cfg.timeout_secs.unwrap_or(60),
            "CompletionService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_chat,
        })
    }

    /// Performs a non-streaming chat completion request.
    ///
    /// Messages: optional system instruction followed by the user prompt.
    /// Model, temperature, top_p and max_tokens come from the config.
    ///
    /// # Errors
    /// - [`LlmError::HttpStatus`] for non-2xx responses
    /// - [`LlmError::HttpTransport`] for client/network failures
    /// - [`LlmError::Decode`] if the JSON cannot be parsed
    /// - [`LlmError::EmptyChoices`] if no choices are returned
    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, LlmError> {
        let started = Instant::now();
        let body = ChatCompletionRequest::from_cfg(&self.cfg, prompt, system);

        debug!(
            model = %self.cfg.model,
            prompt_len = prompt.len(),
            has_system = system.is_some(),
            "POST {}", self.url_chat
        );

        let resp = self.client.post(&self.url_chat).json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_chat.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            error!(
                %status,
                %url,
                %snippet,
                model = %self.cfg.model,
                latency_ms = started.elapsed().as_millis(),
                "chat completion returned non-success status"
            );

            return Err(LlmError::HttpStatus {
                status,
                url,
                snippet,
            });
        }

        let out: ChatCompletionResponse = resp.json().await.map_err(|e| {
            error!(
                error = %e,
                model = %self.cfg.model,
                latency_ms = started.elapsed().as_millis(),
                "failed to decode chat completion response"
            );
            LlmError::Decode(format!(
                "serde error: {e}; expected `choices[0].message.content`"
            ))
        })?;

        let content = out
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .ok_or(LlmError::EmptyChoices)?;

        info!(
            model = %self.cfg.model,
            latency_ms = started.elapsed().as_millis(),
            "chat completion completed"
        );

        Ok(content)
    }
}

impl TextCompletion for CompletionService {
    async fn complete(
        &self,
        system_instruction: &str,
        user_prompt: &str,
    ) -> Result<String, SourceError> {
        self.generate(user_prompt, Some(system_instruction))
            .await
            .map_err(into_source_error)
    }
}

/// Maps crate errors onto the core collaborator-error taxonomy.
fn into_source_error(e: LlmError) -> SourceError {
    match e {
        LlmError::HttpTransport(e) if e.is_timeout() => SourceError::Timeout,
        LlmError::HttpTransport(e) => SourceError::Network(e.to_string()),
        LlmError::HttpStatus { status, .. } => match status.as_u16() {
            401 => SourceError::Unauthorized,
            403 => SourceError::Forbidden,
            404 => SourceError::NotFound,
            429 => SourceError::RateLimited {
                retry_after_secs: None,
            },
            code @ 500..=599 => SourceError::Server(code),
            code => SourceError::HttpStatus(code),
        },
        LlmError::Decode(s) => SourceError::Decode(s),
        LlmError::EmptyChoices => SourceError::Decode("completion returned no choices".into()),
        LlmError::Config(e) => SourceError::Network(e.to_string()),
    }
}

/* ===========================================================================
HTTP payloads
======================================================================== */

/// Minimal request body for `/v1/chat/completions` (non-streaming).
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

impl<'a> ChatCompletionRequest<'a> {
    fn from_cfg(cfg: &'a CompletionConfig, prompt: &'a str, system: Option<&'a str>) -> Self {
        let mut messages = Vec::with_capacity(2);
        if let Some(sys) = system {
            messages.push(ChatMessage {
                role: "system",
                content: sys,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        Self {
            model: &cfg.model,
            messages,
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            max_tokens: cfg.max_tokens,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Minimal response for `/v1/chat/completions`.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageOut,
}

#[derive(Debug, Deserialize)]
struct ChatMessageOut {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> CompletionConfig {
        CompletionConfig {
            model: "gpt-4o-mini".into(),
            endpoint: "https://api.openai.com".into(),
            api_key: "sk-test".into(),
            max_tokens: Some(1000),
            temperature: Some(0.3),
            top_p: None,
            timeout_secs: Some(30),
        }
    }

    #[test]
    fn constructor_rejects_empty_api_key() {
        let bad = CompletionConfig {
            api_key: " ".into(),
            ..cfg()
        };
        assert!(matches!(
            CompletionService::new(bad),
            Err(LlmError::Config(ConfigError::MissingApiKey))
        ));
    }

    #[test]
    fn constructor_rejects_bad_endpoint() {
        let bad = CompletionConfig {
            endpoint: "api.openai.com".into(),
            ..cfg()
        };
        assert!(CompletionService::new(bad).is_err());
    }

    #[test]
    fn chat_url_is_derived_from_endpoint() {
        let svc = CompletionService::new(CompletionConfig {
            endpoint: "https://api.openai.com/".into(),
            ..cfg()
        })
        .unwrap();
        assert_eq!(svc.url_chat, "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn request_body_carries_system_and_user_messages() {
        let config = cfg();
        let body = ChatCompletionRequest::from_cfg(&config, "分析して", Some("あなたは審判です"));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "分析して");
        assert_eq!(json["temperature"], 0.3);
        assert!(json.get("top_p").is_none());
    }

    #[test]
    fn response_decodes_first_choice_content() {
        let raw = r#"{"choices": [{"message": {"role": "assistant", "content": "{\"ok\": true}"}}]}"#;
        let resp: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        let content = resp.choices.into_iter().find_map(|c| c.message.content);
        assert_eq!(content.as_deref(), Some("{\"ok\": true}"));
    }

    #[test]
    fn status_errors_map_onto_source_taxonomy() {
        let err = LlmError::HttpStatus {
            status: reqwest::StatusCode::TOO_MANY_REQUESTS,
            url: "u".into(),
            snippet: String::new(),
        };
        assert!(matches!(
            into_source_error(err),
            SourceError::RateLimited { .. }
        ));
    }
}
