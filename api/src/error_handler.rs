use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use umpire_core::errors::SourceError;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error("missing required environment variable: {0}")]
    MissingEnv(&'static str),

    #[error(transparent)]
    Llm(#[from] llm_service::LlmError),

    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request / routing ---
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Rich HTTP error mapped from the core with specific status & code.
    #[error("{message}")]
    Http {
        status: StatusCode,
        code: &'static str,
        message: String,
    },
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            // startup-only
            AppError::MissingEnv(_) | AppError::Llm(_) => StatusCode::INTERNAL_SERVER_ERROR,

            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Http { status, .. } => *status,

            AppError::Bind(_) | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::MissingEnv(_) => "MISSING_ENV",
            AppError::Llm(_) => "LLM_CONFIG_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Http { code, .. } => code,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.error_code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

/// Converts core errors to `AppError::Http` with precise HTTP status & code.
/// The error kind and message are presented verbatim; each of the core's
/// three terminal kinds keeps a stable machine-readable code.
impl From<umpire_core::Error> for AppError {
    fn from(err: umpire_core::Error) -> Self {
        match err {
            umpire_core::Error::Source(ref source) => {
                let (status, code) = match source {
                    SourceError::NotFound => (StatusCode::NOT_FOUND, "SOURCE_NOT_FOUND"),
                    SourceError::RateLimited { .. } => {
                        (StatusCode::TOO_MANY_REQUESTS, "SOURCE_RATE_LIMITED")
                    }
                    _ => (StatusCode::BAD_GATEWAY, "SOURCE_UNAVAILABLE"),
                };
                AppError::Http {
                    status,
                    code,
                    message: err.to_string(),
                }
            }
            umpire_core::Error::Prompt(_) => AppError::Http {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "PROMPT_UNAVAILABLE",
                message: err.to_string(),
            },
            umpire_core::Error::InvalidResponse(_) => AppError::Http {
                status: StatusCode::BAD_GATEWAY,
                code: "INVALID_RESPONSE_FORMAT",
                message: err.to_string(),
            },
            umpire_core::Error::Validation(message) => AppError::BadRequest(message),
        }
    }
}
