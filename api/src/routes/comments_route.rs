use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use umpire_core::analysis::analyze_comment;
use umpire_core::model::{AnalysisResult, Comment};
use umpire_core::protest::{ConversationTurn, ProtestSession, SessionState, TurnRole, protest_turn};

use crate::core::app_state::AppState;
use crate::error_handler::AppResult;

/// Fetches the replies of one comment (max 100, no pagination).
pub async fn replies_route(
    State(state): State<Arc<AppState>>,
    Path(comment_id): Path<String>,
) -> AppResult<Json<Vec<Comment>>> {
    let replies = state
        .youtube
        .replies(&comment_id)
        .await
        .map_err(umpire_core::Error::from)?;
    Ok(Json(replies))
}

/// Request body for single-comment analysis.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub comment_text: String,
    /// Conversation context: parent first, then prior sibling replies.
    #[serde(default)]
    pub context_comments: Vec<Comment>,
}

/// Runs one analysis and returns the normalized result.
pub async fn analyze_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AnalyzeRequest>,
) -> AppResult<Json<AnalysisResult>> {
    let context: Vec<&Comment> = body.context_comments.iter().collect();
    let result = analyze_comment(
        state.completion.as_ref(),
        &state.templates,
        &body.comment_text,
        &context,
    )
    .await?;
    Ok(Json(result))
}

/// Request body for one protest turn against a prior verdict.
#[derive(Debug, Deserialize)]
pub struct ProtestRequest {
    pub comment_text: String,
    pub original_result: AnalysisResult,
    pub protest_message: String,
    #[serde(default)]
    pub conversation_history: Vec<ConversationTurn>,
}

#[derive(Debug, Serialize)]
pub struct ProtestResponse {
    pub umpire_response: String,
    pub judgment_changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_result: Option<AnalysisResult>,
}

/// Runs one protest turn. The session is rebuilt from the request so the
/// caller owns the conversation history between turns.
pub async fn protest_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ProtestRequest>,
) -> AppResult<Json<ProtestResponse>> {
    let mut session = ProtestSession::new(body.comment_text, body.original_result);
    session.conversation = body.conversation_history;

    let advanced = protest_turn(state.completion.as_ref(), &session, &body.protest_message).await?;

    let umpire_response = advanced
        .conversation
        .iter()
        .rev()
        .find(|turn| turn.role == TurnRole::Arbiter)
        .map(|turn| turn.content.clone())
        .unwrap_or_default();
    let judgment_changed = advanced.state == SessionState::Resolved;

    info!(judgment_changed, "protest turn completed");
    Ok(Json(ProtestResponse {
        umpire_response,
        judgment_changed,
        new_result: judgment_changed.then_some(advanced.current_result),
    }))
}
