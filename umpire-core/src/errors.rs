//! Crate-wide error hierarchy for umpire-core.
//!
//! Goals:
//! - Single root `Error` for all public functions.
//! - The three terminal failure kinds callers present verbatim:
//!   source unavailable, prompt unavailable, invalid response format.
//! - No dynamic dispatch, no async-trait, ergonomic `?` via `From` impls.

use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type UmpResult<T> = Result<T, Error>;

/// Root error type for the umpire-core crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Collaborator transport/API failure (comment source or completion
    /// service). Surfaced as-is; retry policy belongs to the collaborator.
    #[error("source unavailable: {0}")]
    Source(#[from] SourceError),

    /// Missing/unreadable prompt template. Composition fails closed.
    #[error("prompt unavailable: {0}")]
    Prompt(#[from] TemplateError),

    /// Completion output could not be parsed into a result. Never defaulted.
    #[error("invalid response format: {0}")]
    InvalidResponse(#[from] ResponseFormatError),

    /// Input validation errors (bad caps, closed sessions, etc.).
    #[error("validation error: {0}")]
    Validation(String),
}

/// Detailed collaborator transport error.
///
/// Produced by `CommentSource` and `TextCompletion` implementations; the
/// mapping from concrete HTTP errors lives with those implementations.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Unauthorized (HTTP 401).
    #[error("unauthorized")]
    Unauthorized,

    /// Forbidden (HTTP 403), typically an API quota or key restriction.
    #[error("forbidden")]
    Forbidden,

    /// Not found (HTTP 404): unknown video or comment id.
    #[error("not found")]
    NotFound,

    /// Rate limited (HTTP 429).
    #[error("rate limited")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Gateway/Server error (HTTP 5xx).
    #[error("server error: status {0}")]
    Server(u16),

    /// Other HTTP status (4xx/3xx) not covered above.
    #[error("http status error: {0}")]
    HttpStatus(u16),

    /// Timeout at transport level.
    #[error("timeout")]
    Timeout,

    /// Network/transport failure without status (DNS/connect/reset).
    #[error("network error: {0}")]
    Network(String),

    /// Unexpected/invalid shape of a collaborator payload.
    #[error("decode error: {0}")]
    Decode(String),
}

/// Template store errors. `NotFound` on the core template means the
/// analysis request is never sent.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template not found: {0}")]
    NotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Completion-output parsing errors.
#[derive(Debug, Error)]
pub enum ResponseFormatError {
    /// No `{` … `}` span in the completion text.
    #[error("no JSON object in completion output")]
    NoJsonObject,

    /// The extracted span failed to decode as JSON.
    #[error("serde error: {0}")]
    Json(#[from] serde_json::Error),

    /// A field required after normalization is absent or empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A field is present but its value cannot be normalized.
    #[error("invalid field: {0}")]
    InvalidField(&'static str),
}
