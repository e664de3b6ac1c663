use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use umpire_core::flatten::{FlattenPolicy, flatten_thread};
use umpire_core::model::{Comment, VideoInfo};
use youtube_source::extract_video_id;

use crate::core::app_state::AppState;
use crate::error_handler::{AppError, AppResult};

/// Request body for resolving a pasted video URL.
#[derive(Debug, Deserialize)]
pub struct ExtractVideoRequest {
    pub url: String,
}

/// Resolves a YouTube URL to video metadata.
pub async fn extract_video_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ExtractVideoRequest>,
) -> AppResult<Json<VideoInfo>> {
    let video_id = extract_video_id(&body.url)
        .ok_or_else(|| AppError::BadRequest("有効なYouTube URLではありません".into()))?;

    let info = state
        .youtube
        .video_info(&video_id)
        .await
        .map_err(umpire_core::Error::from)?;
    info!(%video_id, "resolved video URL");
    Ok(Json(info))
}

#[derive(Debug, Deserialize)]
pub struct CommentsQuery {
    pub page_token: Option<String>,
    pub max_results: Option<usize>,
    pub policy: Option<FlattenPolicy>,
}

/// Response body for one flatten pass over a video's comments.
#[derive(Debug, Serialize)]
pub struct CommentsResponse {
    pub comments: Vec<Comment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
    pub total_count: usize,
}

/// Materializes one capped, ordered page of a video's comment thread.
pub async fn list_comments_route(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
    Query(query): Query<CommentsQuery>,
) -> AppResult<Json<CommentsResponse>> {
    let cap = query.max_results.unwrap_or(100);
    let policy = query.policy.unwrap_or(FlattenPolicy::InlineReplies);

    let flat = flatten_thread(
        &state.youtube,
        &video_id,
        cap,
        policy,
        query.page_token.as_deref(),
    )
    .await?;

    Ok(Json(CommentsResponse {
        total_count: flat.comments.len(),
        next_page_token: flat.next_page_token,
        comments: flat.comments,
    }))
}
