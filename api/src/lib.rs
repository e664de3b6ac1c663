use std::{env, sync::Arc};

mod core;
mod error_handler;
mod routes;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::signal;
use tracing::info;

pub use crate::error_handler::{AppError, AppResult};

use crate::core::app_state::AppState;
use crate::routes::{
    comments_route::{analyze_route, protest_route, replies_route},
    health_route::health_route,
    prompts_route::{get_prompts_route, update_prompts_route},
    videos_route::{extract_video_route, list_comments_route},
};

pub async fn start() -> Result<(), AppError> {
    let host_url = env::var("API_ADDRESS").map_err(|_| AppError::MissingEnv("API_ADDRESS"))?;
    let state = Arc::new(AppState::from_env()?);

    let app = Router::new()
        .route("/api/health", get(health_route))
        .route("/api/videos/extract", post(extract_video_route))
        .route("/api/videos/{video_id}/comments", get(list_comments_route))
        .route("/api/comments/{comment_id}/replies", get(replies_route))
        .route("/api/comments/analyze", post(analyze_route))
        .route("/api/comments/protest", post(protest_route))
        .route(
            "/api/prompts",
            get(get_prompts_route).put(update_prompts_route),
        )
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&host_url)
        .await
        .map_err(AppError::Bind)?;
    info!(%host_url, "comment-umpire API listening");

    // Start server with graceful shutdown on Ctrl+C
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    Ok(())
}

/// Returns a future that resolves when Ctrl+C is pressed
async fn shutdown_signal() {
    signal::ctrl_c()
        .await
        .expect("Failed to listen for shutdown signal");
}
