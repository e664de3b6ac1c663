use std::sync::Arc;

use llm_service::{CompletionConfig, CompletionService};
use umpire_core::templates::FsTemplateStore;
use youtube_source::{DEFAULT_API_BASE, YouTubeClient};

use crate::error_handler::AppError;

/// Shared state for all HTTP handlers.
///
/// Collaborator clients are constructed here once, with
/// application-controlled lifetime, and passed to the core per request.
#[derive(Clone)]
pub struct AppState {
    /// YouTube Data API client (comment source).
    pub youtube: YouTubeClient,
    /// Chat-completion service shared by analysis and protest turns.
    pub completion: Arc<CompletionService>,
    /// Filesystem prompt-template store.
    pub templates: FsTemplateStore,
}

impl AppState {
    /// Loads shared state from environment variables.
    ///
    /// Required: `YOUTUBE_API_KEY` plus whatever `CompletionConfig::from_env`
    /// requires. Optional: `YOUTUBE_API_BASE`, `PROMPTS_DIR` (default `.`).
    pub fn from_env() -> Result<Self, AppError> {
        let youtube_key =
            std::env::var("YOUTUBE_API_KEY").map_err(|_| AppError::MissingEnv("YOUTUBE_API_KEY"))?;
        let youtube_base =
            std::env::var("YOUTUBE_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.into());
        let prompts_dir = std::env::var("PROMPTS_DIR").unwrap_or_else(|_| ".".into());

        let completion = CompletionService::new(CompletionConfig::from_env()?)?;

        Ok(Self {
            youtube: YouTubeClient::new(reqwest::Client::new(), youtube_base, youtube_key),
            completion: Arc::new(completion),
            templates: FsTemplateStore::new(prompts_dir),
        })
    }
}
