//! Structured-completion service for the comment-umpire backend.
//!
//! - Construct once, wrap in `Arc`, and pass to dependents.
//! - Non-streaming chat completions only; the analysis and protest prompts
//!   both run through the same model profile.
//! - Implements `umpire_core::TextCompletion` so the core never sees the
//!   concrete transport.

pub mod config;
pub mod errors;
pub mod openai;

pub use config::CompletionConfig;
pub use errors::{ConfigError, LlmError};
pub use openai::CompletionService;
